use std::fs::OpenOptions;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use serde_json::Value;
use slide_client::SlidesClient;
use slide_common::Config;
use slide_core::GenerationInput;
use slide_core::GenerationSession;
use slide_protocol::GenerateRequest;
use slide_protocol::GenerationEvent;
use slide_protocol::TemplateGenerateRequest;
use slide_protocol::ToolName;
use slide_tui::preview::write_presentation_file;
use slide_tui::AppOptions;
use slide_tui::PreviewSource;
use slide_tui::StartScreen;
use slide_tui::ThemeRegistry;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slidestream")]
#[command(about = "Generate, view and edit themed slide decks in the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file (TOML or JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a presentation from text
    Generate {
        /// What the presentation is about
        text: Option<String>,
        /// Read the text from a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
        #[arg(short, long)]
        theme: Option<String>,
        /// Number of slides to ask for
        #[arg(short, long)]
        slides: Option<u32>,
        #[arg(long)]
        title: Option<String>,
        /// Print progress instead of opening the app
        #[arg(long)]
        headless: bool,
        /// Write the finished presentation to this file
        #[arg(long)]
        save_json: Option<PathBuf>,
    },
    /// Generate a presentation from a template
    Template {
        id: i64,
        /// Content to fill the template with
        #[arg(short, long)]
        content: String,
        #[arg(short, long)]
        theme: Option<String>,
        /// Template slide numbers to leave out
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<u32>,
        #[arg(long)]
        headless: bool,
        #[arg(long)]
        save_json: Option<PathBuf>,
    },
    /// Open a stored presentation
    View {
        id: Option<i64>,
        /// Open a presentation saved as JSON instead
        #[arg(short, long, conflicts_with = "id")]
        file: Option<PathBuf>,
        #[arg(long)]
        readonly: bool,
    },
    /// List stored presentations
    List {
        #[arg(long, default_value = "20")]
        limit: u32,
    },
    /// List available themes
    Themes,
    /// List presentation templates
    Templates,
    /// Delete a stored presentation
    Delete { id: i64 },
    /// Create a share link for a presentation
    Share { id: i64 },
    /// Print the PDF export URL of a presentation
    Pdf { id: i64 },
}

struct Runtime {
    config: Config,
    client: SlidesClient,
    registry: ThemeRegistry,
}

impl Runtime {
    fn load(cli: &Cli) -> Result<Self> {
        let mut config = Config::resolve(cli.config.as_deref())?;
        if let Some(url) = &cli.api_url {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }
        let registry = ThemeRegistry::load(config.themes_file.as_deref())?;
        let client = SlidesClient::new(config.api_base_url.clone());
        Ok(Self {
            config,
            client,
            registry,
        })
    }

    fn session(&self, theme: Option<&str>) -> GenerationSession {
        let theme = theme.unwrap_or(self.config.default_theme.as_str());
        GenerationSession::new(Arc::new(self.client.clone()), theme)
    }

    fn app_options(&self) -> AppOptions {
        AppOptions {
            default_slide_count: self.config.default_slide_count,
            ..AppOptions::default()
        }
    }
}

fn init_logging(path: &Path, debug: bool) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow!("failed to install logger: {err}"))
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let ctx = Runtime::load(&cli)?;
    init_logging(&ctx.config.log_path(), cli.debug)?;
    info!("using backend {}", ctx.config.api_base_url);

    match cli.command {
        Some(Commands::Generate {
            text,
            file,
            theme,
            slides,
            title,
            headless,
            save_json,
        }) => {
            let text = match (text, file) {
                (Some(text), _) => Some(text),
                (None, Some(path)) => Some(
                    std::fs::read_to_string(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?,
                ),
                (None, None) => None,
            };
            let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
                if headless {
                    bail!("nothing to generate: pass text or --file");
                }
                return interactive(&ctx, StartScreen::Compose { text: None }).await;
            };
            let input = GenerationInput::Text(GenerateRequest {
                text,
                slide_count: Some(slides.unwrap_or(ctx.config.default_slide_count)),
                title,
                theme: Some(theme.unwrap_or_else(|| ctx.config.default_theme.clone())),
            });
            generate(&ctx, input, headless, save_json.as_deref()).await?;
        }
        Some(Commands::Template {
            id,
            content,
            theme,
            exclude,
            headless,
            save_json,
        }) => {
            let template = ctx.client.get_template(id).await?;
            let slide_count = template
                .slides
                .len()
                .saturating_sub(exclude.len())
                .try_into()
                .ok();
            let input = GenerationInput::Template {
                template_id: id,
                request: TemplateGenerateRequest {
                    user_content: content,
                    theme: theme.or_else(|| Some(template.theme).filter(|t| !t.is_empty())),
                    variables: None,
                    excluded_slides: Some(exclude).filter(|e| !e.is_empty()),
                },
                slide_count,
            };
            generate(&ctx, input, headless, save_json.as_deref()).await?;
        }
        Some(Commands::View { id, file, readonly }) => {
            let source = match (id, file) {
                (Some(id), _) => PreviewSource::Remote(id),
                (None, Some(path)) => PreviewSource::File(path),
                (None, None) => bail!("pass a presentation id or --file"),
            };
            slide_tui::run_preview(ctx.session(None), ctx.registry.clone(), source, !readonly)
                .await?;
        }
        Some(Commands::List { limit }) => {
            let presentations = ctx.client.list_presentations(0, limit).await?;
            if presentations.is_empty() {
                println!("No presentations yet.");
            }
            for p in presentations {
                println!(
                    "{:>6}  {:<40}  {:<14}  {} slides",
                    p.id, p.title, p.theme, p.slide_count
                );
            }
        }
        Some(Commands::Themes) => {
            for entry in ctx.registry.list() {
                let marker = if entry.theme.name == ctx.config.default_theme {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{marker} {:<14} {:<14} {}",
                    entry.theme.name, entry.theme.display_name, entry.theme.description
                );
            }
        }
        Some(Commands::Templates) => {
            for t in ctx.client.list_templates().await? {
                println!(
                    "{:>6}  {:<32}  {:<12}  {} slides",
                    t.id, t.name, t.category, t.slide_count
                );
            }
        }
        Some(Commands::Delete { id }) => {
            ctx.client.delete_presentation(id).await?;
            info!("deleted presentation {id}");
            println!("Deleted presentation {id}");
        }
        Some(Commands::Share { id }) => {
            let link = ctx.client.create_share_link(id).await?;
            println!("{}", link.url);
        }
        Some(Commands::Pdf { id }) => println!("{}", ctx.client.pdf_export_url(id)),
        None => interactive(&ctx, StartScreen::Compose { text: None }).await?,
    }

    Ok(())
}

async fn interactive(ctx: &Runtime, start: StartScreen) -> Result<()> {
    slide_tui::run_app(ctx.session(None), ctx.registry.clone(), ctx.app_options(), start).await?;
    Ok(())
}

async fn generate(
    ctx: &Runtime,
    input: GenerationInput,
    headless: bool,
    save_json: Option<&Path>,
) -> Result<()> {
    let session = ctx.session(input.theme().as_deref());
    let session = if headless {
        run_headless(session, &input).await?
    } else {
        slide_tui::run_app(
            session,
            ctx.registry.clone(),
            ctx.app_options(),
            StartScreen::Generate(input),
        )
        .await?
    };

    let state = session.state();
    if let Some(error) = state.error() {
        bail!("generation failed: {error}");
    }
    match (state.presentation(), save_json) {
        (Some(presentation), Some(path)) => {
            write_presentation_file(path, presentation)?;
            println!("Saved {}", path.display());
        }
        (None, Some(_)) => bail!("generation did not finish, nothing saved"),
        _ => {}
    }
    if let Some(id) = state.presentation().and_then(|p| p.id) {
        println!("Presentation {id} ready");
    }
    Ok(())
}

/// Runs a generation without the app, printing one line per event.
async fn run_headless(
    mut session: GenerationSession,
    input: &GenerationInput,
) -> Result<GenerationSession> {
    let mut stream = session.begin(input).await?;
    loop {
        let seen = session.state().history().len();
        let more = session.apply_stream_item(stream.next().await);
        for event in &session.state().history()[seen..] {
            if let Some(line) = describe(event) {
                println!("{line}");
            }
        }
        if !more {
            break;
        }
    }
    Ok(session)
}

fn describe(event: &GenerationEvent) -> Option<String> {
    match event {
        GenerationEvent::Thinking { message, .. } => Some(format!("… {message}")),
        GenerationEvent::ToolCall(call) => match &call.tool {
            ToolName::AddSlide => Some(format!(
                "+ slide {} ({}) {}",
                call.slide_number.unwrap_or_default(),
                call.slide_type().unwrap_or("content"),
                call.title().unwrap_or_default()
            )),
            ToolName::FinishPresentation => Some(format!(
                "✓ finalizing {}",
                call.args
                    .get("title")
                    .and_then(Value::as_str)
                    .unwrap_or("presentation")
            )),
            ToolName::Other(_) => None,
        },
        GenerationEvent::Complete(completion) => Some(format!(
            "✓ done: {} slides",
            completion
                .slide_count
                .map(|n| n as usize)
                .or_else(|| completion.presentation.as_ref().map(|p| p.slides.len()))
                .unwrap_or_default()
        )),
        GenerationEvent::Error { .. } => event.error_message().map(|m| format!("✗ {m}")),
        GenerationEvent::ToolResult(_) | GenerationEvent::Opaque { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use slide_protocol::Completion;
    use slide_protocol::Slide;
    use slide_protocol::SlideContent;
    use slide_protocol::ToolCall;

    #[test]
    fn command_line_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_generate_flags() {
        let cli = Cli::try_parse_from([
            "slidestream",
            "generate",
            "Rust in production",
            "--theme",
            "dark",
            "--slides",
            "5",
            "--headless",
        ])
        .unwrap();
        let Some(Commands::Generate {
            text,
            theme,
            slides,
            headless,
            ..
        }) = cli.command
        else {
            panic!("expected generate");
        };
        assert_eq!(text.as_deref(), Some("Rust in production"));
        assert_eq!(theme.as_deref(), Some("dark"));
        assert_eq!(slides, Some(5));
        assert!(headless);
    }

    #[test]
    fn template_excludes_are_comma_separated() {
        let cli =
            Cli::try_parse_from(["slidestream", "template", "3", "-c", "Q3", "--exclude", "2,4"])
                .unwrap();
        let Some(Commands::Template { id, exclude, .. }) = cli.command else {
            panic!("expected template");
        };
        assert_eq!(id, 3);
        assert_eq!(exclude, vec![2, 4]);
    }

    #[test]
    fn view_takes_an_id_or_a_file() {
        assert!(Cli::try_parse_from(["slidestream", "view", "7", "--file", "a.json"]).is_err());
        let cli = Cli::try_parse_from(["slidestream", "view", "--file", "a.json", "--readonly"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::View { id: None, file: Some(_), readonly: true })
        ));
    }

    #[test]
    fn describes_visible_events() {
        let slide = Slide::new(
            2,
            SlideContent::Title {
                title: Some("Hello".into()),
                subtitle: None,
            },
        );
        let add = GenerationEvent::ToolCall(ToolCall::add_slide(2, slide));
        assert_eq!(describe(&add).as_deref(), Some("+ slide 2 (title) Hello"));
        let done = GenerationEvent::Complete(Completion {
            slide_count: Some(4),
            ..Completion::default()
        });
        assert_eq!(describe(&done).as_deref(), Some("✓ done: 4 slides"));
        let failed = GenerationEvent::Error {
            message: Some("quota".into()),
        };
        assert_eq!(describe(&failed).as_deref(), Some("✗ quota"));
    }
}
