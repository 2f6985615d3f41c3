use clap::{Parser, Subcommand};
use letters::config::{self, SiteConfig, StoreBackend};
use letters::gallery::{self, MessageSource};
use letters::github::{Credential, GitHubStore};
use letters::publish::{self, ImageUpload, PublishRequest};
use letters::store::{ContentStore, DirStore};
use letters::visit::VisitStore;
use letters::{output, render};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "letters")]
#[command(about = "Publish and render a gallery of letters kept in a repository")]
#[command(long_about = "\
Publish and render a gallery of letters kept in a repository

Every letter is one record in a JSON list (data/messages.json by default)
plus one uploaded image (uploads/ by default). `publish` uploads the image
and prepends the record; `render` and `list` show the letters newest first,
flagging the ones created since the last time you looked.

Repository layout:

  data/
  └── messages.json        # [{id, title, message, imageUrl, eventName, createdAt}, ...]
  uploads/
  └── happy-anniversary-1707903000000.jpg
  assets/
  └── couple.jpg           # Landing-screen image (site.cover_image)

Run 'letters gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Where to read letters from and where to keep the last-visit marker.
#[derive(clap::Args, Clone)]
struct ViewArgs {
    /// Message list: a URL or a local path. Defaults to paths.messages under store.root
    #[arg(long)]
    messages: Option<String>,

    /// State file holding the last-visit marker
    #[arg(long, default_value = ".letters-state.json")]
    state: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Upload an image and add a letter to the message list
    Publish {
        /// Access token for the content API (kept in memory only)
        #[arg(long, env = "LETTERS_TOKEN", hide_env_values = true, default_value = "")]
        token: String,
        #[arg(long, default_value = "")]
        title: String,
        /// Optional event name shown with the letter
        #[arg(long = "event", default_value = "")]
        event_name: String,
        #[arg(long, default_value = "")]
        message: String,
        /// Image file to upload
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Render the gallery page to <output>/index.html
    Render {
        #[command(flatten)]
        view: ViewArgs,
        /// Output directory
        #[arg(long, default_value = "dist")]
        output: PathBuf,
    },
    /// Print the letters, newest first
    List {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "letters=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Publish {
            token,
            title,
            event_name,
            message,
            image,
        } => {
            let site_config = config::load_config(&cli.config_dir)?;
            site_config.validate_for_publish()?;

            let image = match image.as_deref().map(ImageUpload::read).transpose() {
                Ok(image) => image,
                Err(e) => {
                    tracing::error!(error = %e, "publish failed");
                    fail(e.user_message());
                }
            };
            let request = PublishRequest {
                title,
                event_name,
                message,
                image,
            };

            let store: Box<dyn ContentStore> = match site_config.store.backend {
                StoreBackend::GitHub => {
                    let Some(credential) = Credential::new(&token) else {
                        fail(publish::MISSING_FIELDS_MESSAGE);
                    };
                    Box::new(GitHubStore::new(&site_config.repository, credential)?)
                }
                StoreBackend::Directory => Box::new(DirStore::new(&site_config.store.root)),
            };

            println!("Uploading...");
            match publish::publish(
                store.as_ref(),
                &site_config.paths,
                &request,
                chrono::Utc::now(),
            ) {
                Ok(published) => {
                    output::print_publish_output(&published);
                    println!("Uploaded successfully.");
                }
                Err(e) => fail(e.user_message()),
            }
        }
        Command::Render { view, output } => {
            let site_config = config::load_config(&cli.config_dir)?;
            let visits = VisitStore::new(&view.state);
            let gallery_view = load_view(&site_config, &view, &visits);
            let path = render::write_site(&gallery_view, &site_config, &output)?;
            gallery::commit_visit(&gallery_view, &visits, chrono::Utc::now());
            println!(
                "Rendered {} letters ({} new) → {}",
                gallery_view.cards().len(),
                gallery_view.new_count(),
                path.display()
            );
        }
        Command::List { view } => {
            let site_config = config::load_config(&cli.config_dir)?;
            let visits = VisitStore::new(&view.state);
            let gallery_view = load_view(&site_config, &view, &visits);
            output::print_gallery_output(&gallery_view);
            gallery::commit_visit(&gallery_view, &visits, chrono::Utc::now());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Print the user-facing failure line and exit non-zero. Details are in the
/// log on stderr.
fn fail(message: &str) -> ! {
    println!("{}", message);
    std::process::exit(1);
}

fn load_view(
    site_config: &SiteConfig,
    args: &ViewArgs,
    visits: &VisitStore,
) -> gallery::GalleryView {
    let source = match &args.messages {
        Some(raw) => MessageSource::parse(raw),
        None => MessageSource::Path(site_config.store.root.join(&site_config.paths.messages)),
    };
    gallery::present(&source, visits)
}
