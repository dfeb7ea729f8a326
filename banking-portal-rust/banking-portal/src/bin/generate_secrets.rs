use base64::Engine;
use clap::{Parser, ValueEnum};
use rand::Rng;

use banking_portal::domain::auth::SessionManager;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Encoding {
    Hex,
    Base64,
}

/// Prints a fresh SECRET_KEY for the banking portal.
#[derive(Debug, Parser)]
#[command(name = "generate_secrets", version)]
struct Args {
    /// Encoding of the 512-bit key
    #[arg(long, value_enum, default_value = "hex")]
    encoding: Encoding,

    /// Print only the key, without the `SECRET_KEY=` prefix
    #[arg(long)]
    raw: bool,
}

fn main() {
    let args = Args::parse();

    let key = match args.encoding {
        Encoding::Hex => SessionManager::generate_secret_key(),
        Encoding::Base64 => {
            let bytes: [u8; 64] = rand::rng().random();
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
        }
    };

    if args.raw {
        println!("{key}");
        return;
    }

    println!("SECRET_KEY={key}");
    eprintln!();
    eprintln!("Store this key in the environment or in .env. Never commit it to version control.");
    eprintln!("Changing the key logs out every session.");
}
