//! pvls --- inspect a unified mount set from the command line.
//!
//! Sources given with `--mount` join the search path in order, so earlier
//! ones shadow later ones. A TOML profile can seed the setup first.

use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use packvfs::{FileKind, Profile, Vfs};

#[derive(Parser)]
#[command(name = "pvls", about = "List and read files across mounted directories and archives")]
struct Cli {
    /// Source to mount, in search order. `SRC` or `SRC=MOUNTPOINT`.
    #[arg(short, long = "mount", value_name = "SRC[=POINT]")]
    mount: Vec<String>,

    /// TOML mount profile applied before any --mount source.
    #[arg(long, value_name = "FILE")]
    profile: Option<PathBuf>,

    /// Directory receiving writes, mkdirs and deletes.
    #[arg(long, value_name = "DIR")]
    write_dir: Option<String>,

    /// Follow symbolic links inside mounted directories.
    #[arg(long)]
    permit_symlinks: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List one directory of the virtual tree.
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Print a file to stdout.
    Cat { path: String },
    /// Show metadata for a path.
    Stat { path: String },
    /// Walk the whole tree beneath a path.
    Tree {
        #[arg(default_value = "/")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => {
            eprintln!("pvls: {code}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> packvfs::Result<()> {
    let argv0 = std::env::args().next();
    let vfs = Vfs::new(argv0.as_deref())?;

    if let Some(path) = &cli.profile {
        let profile = Profile::load(path).await?;
        vfs.apply_profile(&profile).await?;
    }
    if cli.permit_symlinks {
        vfs.permit_symbolic_links(true);
    }
    if let Some(dir) = &cli.write_dir {
        vfs.set_write_dir(Some(dir)).await?;
    }
    for spec in &cli.mount {
        let (source, point) = match spec.split_once('=') {
            Some((source, point)) => (source, Some(point)),
            None => (spec.as_str(), None),
        };
        vfs.mount(source, point, true).await?;
    }

    match &cli.command {
        Command::Ls { path } => {
            for name in vfs.enumerate_files(path).await? {
                println!("{name}");
            }
        }
        Command::Cat { path } => cat(&vfs, path).await?,
        Command::Stat { path } => {
            let stat = vfs.stat(path).await?;
            let kind = match stat.kind {
                FileKind::Regular => "file",
                FileKind::Directory => "directory",
                FileKind::Symlink => "symlink",
                FileKind::Other => "other",
            };
            println!("kind:     {kind}");
            println!("size:     {}", stat.size);
            println!("mtime:    {}", stat.mtime);
            println!("readonly: {}", stat.readonly);
            if let Ok(real) = vfs.real_dir(path).await {
                println!("source:   {real}");
            }
        }
        Command::Tree { path } => tree(&vfs, path).await?,
    }
    Ok(())
}

async fn cat(vfs: &Vfs, path: &str) -> packvfs::Result<()> {
    let file = vfs.open_read(path).await?;
    let mut stdout = std::io::stdout().lock();
    let mut chunk = [0u8; 64 * 1024];
    loop {
        let got = vfs.read_bytes(file, &mut chunk).await?;
        if got == 0 {
            break;
        }
        if stdout.write_all(&chunk[..got]).is_err() {
            break;
        }
    }
    vfs.close(file).await
}

async fn tree(vfs: &Vfs, start: &str) -> packvfs::Result<()> {
    let mut pending = vec![packvfs::sanitize(start)?];
    while let Some(dir) = pending.pop() {
        for name in vfs.enumerate_files(&dir).await? {
            let full = if dir.is_empty() { name } else { format!("{dir}/{name}") };
            if vfs.is_directory(&full).await {
                println!("{full}/");
                pending.push(full);
            } else {
                println!("{full}");
            }
        }
    }
    Ok(())
}
