use color_eyre::owo_colors::OwoColorize;

use crate::api::response::{ArtistLink, UserProfile};

/// How many recently played artists are listed
pub const RECENT_ARTISTS_SHOWN: usize = 15;

/// Where the client sends everything the user should see.
pub trait Presenter {
    fn show_status(&mut self, message: &str);
    fn show_profile(&mut self, profile: &UserProfile);
    fn show_artist_lists(&mut self, top: &[ArtistLink], recent: &[ArtistLink]);
}

/// Presenter that prints to stdout
#[derive(Debug, Default)]
pub struct Terminal;

impl Terminal {
    fn field(label: &str, value: &str) {
        println!("  {:<10} {}", label.dimmed(), value);
    }

    fn artists(title: &str, artists: &[ArtistLink], empty: &str) {
        println!("\n{}", title.bold());
        if artists.is_empty() {
            println!("  {}", empty.dimmed());
        }
        for (i, artist) in artists.iter().enumerate() {
            println!("  {:>2}. {} {}", i + 1, artist.name.green(), artist.url.dimmed());
        }
    }
}

impl Presenter for Terminal {
    fn show_status(&mut self, message: &str) {
        println!("{} {}", "●".cyan(), message);
    }

    fn show_profile(&mut self, profile: &UserProfile) {
        println!("\n{}", profile.display_name.as_deref().unwrap_or_default().bold().green());
        Terminal::field("id", &profile.id);
        Terminal::field("email", profile.email.as_deref().unwrap_or_default());
        Terminal::field("uri", &profile.uri);
        Terminal::field("link", profile.spotify_url().unwrap_or("#"));
        Terminal::field("href", &profile.href);
        Terminal::field(
            "image",
            profile
                .images
                .first()
                .map(|i| i.url.as_str())
                .unwrap_or("(no profile image)"),
        );
    }

    fn show_artist_lists(&mut self, top: &[ArtistLink], recent: &[ArtistLink]) {
        Terminal::artists("Most played artists", top, "(no data)");
        Terminal::artists(
            "Recently played artists",
            &recent[..recent.len().min(RECENT_ARTISTS_SHOWN)],
            "(no recent history)",
        );
        println!();
    }
}
