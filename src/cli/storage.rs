use clap::Parser;

#[derive(Parser)]
pub struct StorageCommand {
    #[clap(subcommand)]
    subcommand: StorageSubcommand,
}

#[derive(Parser)]
enum StorageSubcommand {
    #[clap(name = "info", about = "Get local storage location, entries and size")]
    Info,
    #[clap(name = "show", about = "Show a stored response and its freshness")]
    Show(ShowStorage),
}

#[derive(Parser)]
struct ShowStorage {
    /// Storage key of the response
    #[clap()]
    key: String,
}

pub enum StorageOptions {
    Info,
    Show { key: String },
}

impl From<StorageCommand> for StorageOptions {
    fn from(options: StorageCommand) -> Self {
        match options.subcommand {
            StorageSubcommand::Info => StorageOptions::Info,
            StorageSubcommand::Show(show) => StorageOptions::Show { key: show.key },
        }
    }
}
