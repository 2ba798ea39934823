use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use vimusync::configuration::{create_config, ConfigFolder};
use vimusync::startup::{run, Action};

fn browse_id_arg() -> Arg {
    Arg::new("browse_id").required(true).help("Remote browse id")
}

fn play_arg() -> Arg {
    Arg::new("play")
        .long("play")
        .value_name("INDEX")
        .value_parser(value_parser!(usize))
        .help("Replace the queue and start at this position")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Command::new("vimusync")
        .about("🎵 Music client with a local cache for artists, albums and queues 🎵")
        .subcommand(Command::new("config").about("🛠️ Create or update configuration file for vimusync"))
        .subcommand(
            Command::new("artist")
                .about("🎤 Show an artist with its songs and albums")
                .arg(browse_id_arg())
                .arg(
                    Arg::new("shuffle")
                        .long("shuffle")
                        .action(ArgAction::SetTrue)
                        .help("Play the artist's shuffle mix"),
                )
                .arg(
                    Arg::new("shuffle_library")
                        .long("shuffle-library")
                        .action(ArgAction::SetTrue)
                        .help("Shuffle the artist's songs from your library"),
                )
                .arg(
                    Arg::new("radio")
                        .long("radio")
                        .action(ArgAction::SetTrue)
                        .help("Start the artist's radio"),
                ),
        )
        .subcommand(
            Command::new("album")
                .about("💿 Show an album and its tracks")
                .arg(browse_id_arg())
                .arg(play_arg()),
        )
        .subcommand(
            Command::new("open")
                .about("🔗 Open a shared music link")
                .arg(Arg::new("uri").required(true).help("Music share link"))
                .arg(play_arg())
                .arg(
                    Arg::new("enqueue")
                        .long("enqueue")
                        .action(ArgAction::SetTrue)
                        .help("Append instead of replacing the queue"),
                )
                .arg(
                    Arg::new("import")
                        .long("import")
                        .value_name("NAME")
                        .help("Save the songs as a local playlist"),
                ),
        )
        .subcommand(
            Command::new("retry")
                .about("🔁 Load an artist again after a failed attempt")
                .arg(browse_id_arg()),
        )
        .get_matches();

    let cfg_folder = ConfigFolder::new()?;

    let action = match args.subcommand() {
        Some(("config", _)) => {
            println!("\x1b[1m\x1b[34mConfiguring vimusync...\x1b[0m");
            return create_config(&cfg_folder).map_err(|e| anyhow::anyhow!("{}", e));
        }
        Some(("artist", sub)) => Action::Artist {
            browse_id: browse_id(sub),
            shuffle: sub.get_flag("shuffle"),
            shuffle_library: sub.get_flag("shuffle_library"),
            radio: sub.get_flag("radio"),
        },
        Some(("album", sub)) => Action::Album {
            browse_id: browse_id(sub),
            play_index: sub.get_one::<usize>("play").copied(),
        },
        Some(("open", sub)) => Action::Open {
            uri: sub.get_one::<String>("uri").cloned().unwrap_or_default(),
            play_index: sub.get_one::<usize>("play").copied(),
            enqueue: sub.get_flag("enqueue"),
            import: sub.get_one::<String>("import").cloned(),
        },
        Some(("retry", sub)) => Action::Retry {
            browse_id: browse_id(sub),
        },
        _ => {
            print_usage();
            return Ok(());
        }
    };

    run(cfg_folder, action).await
}

fn browse_id(matches: &ArgMatches) -> String {
    matches
        .get_one::<String>("browse_id")
        .cloned()
        .unwrap_or_default()
}

fn print_usage() {
    println!("\x1b[1m\x1b[31mInvalid command!\x1b[0m\n");
    println!("📖 Available Commands:");
    println!("  \x1b[1m\x1b[32mvimusync config\x1b[0m         - 🛠️  Create or update configuration file");
    println!("  \x1b[1m\x1b[32mvimusync artist <id>\x1b[0m    - 🎤 Show an artist");
    println!("  \x1b[1m\x1b[32mvimusync album <id>\x1b[0m     - 💿 Show an album");
    println!("  \x1b[1m\x1b[32mvimusync open <link>\x1b[0m    - 🔗 Open a shared link");
    println!("  \x1b[1m\x1b[32mvimusync retry <id>\x1b[0m     - 🔁 Retry loading an artist");
    println!("\x1b[33mRun 'vimusync <command> --help' for options.\x1b[0m\n");
}
