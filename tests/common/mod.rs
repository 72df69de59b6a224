use rand::Rng;
use std::fs::File;
use std::io::Error;
use std::path::Path;

pub const HEADER: [&str; 8] = [
    "op", "date", "user", "book", "title", "name", "email", "amount",
];

/// Generates a replay that registers, approves and stocks one book per user,
/// then applies `rows` randomized order/return/sweep events.
pub fn generate_events(path: &Path, users: usize, rows: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(HEADER)?;
    for i in 1..=users {
        wtr.write_record([
            "register",
            "2024-01-01",
            "",
            "",
            "",
            &format!("User {i}"),
            &format!("user{i}@example.com"),
            "",
        ])?;
        wtr.write_record([
            "approve",
            "2024-01-01",
            &i.to_string(),
            "",
            "",
            "",
            "",
            "",
        ])?;
        wtr.write_record([
            "add-book",
            "2024-01-01",
            "",
            "",
            &format!("Book {i}"),
            "",
            "",
            "",
        ])?;
    }

    let mut rng = rand::thread_rng();
    for row in 0..rows {
        let day = 2 + (row * 26 / rows.max(1));
        let date = format!("2024-01-{day:02}");
        let user = rng.gen_range(1..=users).to_string();
        let book = rng.gen_range(1..=users).to_string();
        let roll: f64 = rng.gen_range(0.0..1.0);
        if roll < 0.5 {
            wtr.write_record(["order", &date, &user, &book, "", "", "", ""])?;
        } else if roll < 0.9 {
            wtr.write_record(["return", &date, &user, &book, "", "", "", "0"])?;
        } else {
            wtr.write_record(["sweep", &date, "", "", "", "", "", ""])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
