use crate::book::BookInfo;
use anyhow::Result;
use colored::Colorize;

pub fn run(title: &str, json: bool) -> Result<()> {
    let info = BookInfo::parse(title)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    print_field("Title", Some(&info.title));
    print_field("Author", info.author.as_deref());
    print_field("Narrator", info.narrator.as_deref());
    let artist = info.artist();
    print_field("Artist", Some(artist.as_str()).filter(|a| !a.is_empty()));

    Ok(())
}

fn print_field(label: &str, value: Option<&str>) {
    if let Some(v) = value {
        println!("{:>12}: {}", label.cyan(), v);
    }
}
