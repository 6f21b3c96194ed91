use clap::Parser;
use marinex::config::{BoatCommand, Command, DocumentCommand, RecordArgs, RouteCommand};
use marinex::core::documents::DocumentValidity;
use marinex::core::kpi::fetch_dashboard;
use marinex::core::{
    ApiClient, AuthSession, BoatService, CategoryFilter, CompanyDirectory, DocumentService, Landing,
    RouteService, ServerExport, TaskService, WorkService,
};
use marinex::domain::model::{FileUpload, Registration};
use marinex::domain::ports::{Storage, SystemClock};
use marinex::tracking::geo::{path_length_m, speed_knots};
use marinex::tracking::{export, ExportFormat, Logbook, Mode, ReplayGeolocation, Tick, TrackPoint};
use marinex::utils::error::{ErrorSeverity, MarinexError, Result};
use marinex::utils::{logger, validation::Validate};
use marinex::{CliConfig, ClientConfig, FileSessionStore, LocalStorage};
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    if let Err(e) = cli.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(cli).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // 依錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Medium => 2, // 可重試
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3, // 系統錯誤
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

async fn run(cli: CliConfig) -> Result<()> {
    let config = cli.client_config()?;
    let session = Arc::new(FileSessionStore::open(&config.session.path));
    let client = ApiClient::from_config(&config, session)?;
    let output = LocalStorage::new(&cli.output_path);

    match cli.command {
        Command::Login { username, password } => {
            let outcome = AuthSession::new(client).login(&username, &password).await?;
            println!("✅ Logged in as {}", outcome.user.display_name());
            match outcome.landing {
                Landing::Dashboard => println!("➡️  Open your fleet with `marinex boats list`"),
                Landing::AddBoat => println!("➡️  No boats yet, add your first boat"),
            }
        }
        Command::Logout => {
            AuthSession::new(client).logout().await?;
            println!("👋 Logged out");
        }
        Command::Whoami => match AuthSession::new(client).check_user().await? {
            Some(user) => println!("{} <{}> ({})", user.display_name(), user.email, user.username),
            None => return Err(MarinexError::NotAuthenticated),
        },
        Command::Register(args) => {
            let registration = Registration {
                username: args.username,
                password: args.password,
                email: args.email,
                first_name: args.first_name,
                last_name: args.last_name,
                phone_number: None,
                dni: None,
                account_name: args.account_name,
            };
            let user = AuthSession::new(client).register(&registration).await?;
            println!("✅ Account created for {}", user.username);
        }
        Command::Boats(command) => boats(require_login(client)?, command).await?,
        Command::Documents(command) => documents(require_login(client)?, command).await?,
        Command::Tasks { boat } => {
            let tasks = TaskService::new(require_login(client)?);
            let statuses = tasks.statuses().await?;
            let categories = tasks.categories(CategoryFilter::All).await?;
            let list = tasks.list(boat).await?;
            for (status, items) in marinex::core::tasks::group_by_status(&list, &statuses) {
                println!("## {} ({})", status.map_or("No status", |s| s.name.as_str()), items.len());
                for task in items {
                    let category = task
                        .category
                        .and_then(|id| categories.iter().find(|c| c.id == id))
                        .map_or("-", |c| c.name.as_str());
                    println!(
                        "  {} [{}] {} ({}) due {}",
                        task.id,
                        task.priority.as_deref().unwrap_or("-"),
                        task.title,
                        category,
                        task.due_date.map_or("-".to_string(), |d| d.format("%Y-%m-%d").to_string())
                    );
                }
            }
        }
        Command::Works { boat } => {
            let works = WorkService::new(require_login(client)?).list(boat).await?;
            for work in works {
                println!(
                    "{} {} [{}] est {:.2}€ final {:.2}€",
                    work.id,
                    work.title,
                    work.status_code().unwrap_or("-"),
                    work.cost_estimate.unwrap_or(0.0),
                    work.cost_final.unwrap_or(0.0)
                );
            }
        }
        Command::Companies { search } => {
            let companies = CompanyDirectory::new(require_login(client)?)
                .search(search.as_deref())
                .await?;
            for company in companies {
                println!(
                    "{} {} {} {}",
                    company.id,
                    company.name,
                    company.phone.as_deref().unwrap_or("-"),
                    company.email.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Dashboard { boat } => {
            let dashboard = fetch_dashboard(&require_login(client)?, boat).await?;
            let stats = &dashboard.stats;
            println!(
                "📋 Tasks: {} total, {} completed, {} high priority",
                stats.tasks.total, stats.tasks.completed, stats.tasks.high_priority
            );
            println!(
                "🔧 Works: {} total, {} planned, {:.2}€ estimated, {:.2}€ real",
                stats.works.total, stats.works.planned, stats.works.estimated_cost, stats.works.real_cost
            );
            println!(
                "📄 Documents: {} total, {} expired",
                stats.documents.total, stats.documents.expired
            );
            for (day, events) in dashboard.events_by_date() {
                for event in events {
                    println!(
                        "{} {:<8} {} {}",
                        day,
                        event.kind.label(),
                        event.title,
                        event.meta.as_deref().unwrap_or("")
                    );
                }
            }
        }
        Command::Routes(command) => routes(require_login(client)?, &output, command).await?,
        Command::Record(args) => record(require_login(client)?, &config, args).await?,
        Command::Replay { boat, route, step } => {
            let client = require_login(client)?;
            let mut tracking = config.tracking.clone();
            if let Some(step) = step {
                tracking.playback_step = step;
            }
            let routes = Arc::new(RouteService::new(client));
            let mut book = Logbook::new(
                boat,
                routes,
                Arc::new(ReplayGeolocation::new(Vec::new())),
                Arc::new(SystemClock),
                &tracking,
            )?;
            book.set_mode(Mode::History).await?;
            let selected = book.select_route(route)?;
            println!("▶️  {} ({} points)", selected.display_name(), selected.points.len());

            book.play()?;
            loop {
                match book.tick() {
                    Tick::Frame(frame) => println!(
                        "#{:<4} {:.5},{:.5} {:>5.1}° {:>5.1} kn {}",
                        frame.index,
                        frame.position.lat,
                        frame.position.lng,
                        frame.bearing,
                        speed_knots(frame.speed),
                        frame.timestamp.format("%H:%M:%S")
                    ),
                    Tick::Finished | Tick::Idle => break,
                }
            }
            println!("⏹️  Playback finished");
        }
    }

    Ok(())
}

fn require_login(client: ApiClient) -> Result<ApiClient> {
    if client.session().access_token().is_none() {
        return Err(MarinexError::NotAuthenticated);
    }
    Ok(client)
}

async fn boats(client: ApiClient, command: BoatCommand) -> Result<()> {
    let boats = BoatService::new(client);
    match command {
        BoatCommand::List => {
            for boat in boats.list().await? {
                println!(
                    "{} {} {} {}",
                    boat.id,
                    boat.name,
                    boat.brand_name.as_deref().unwrap_or("-"),
                    boat.model_name.as_deref().unwrap_or("-")
                );
            }
        }
        BoatCommand::Show { boat } => {
            let boat = boats.get(boat).await?;
            println!("⛵ {} ({})", boat.name, boat.id);
            println!("   Registration: {}", boat.registration_number.as_deref().unwrap_or("-"));
            println!("   Port: {}", boat.port_name.as_deref().unwrap_or("-"));
            if let (Some(length), Some(width)) = (boat.length, boat.width) {
                println!("   Size: {:.2} m x {:.2} m", length, width);
            }
            println!("   Photos: {}", boat.attachments.len());
        }
    }
    Ok(())
}

fn mime_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("pdf") => "application/pdf",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

async fn documents(client: ApiClient, command: DocumentCommand) -> Result<()> {
    let documents = DocumentService::new(client);
    match command {
        DocumentCommand::List { boat } => {
            let now = chrono::Utc::now();
            for document in documents.list(boat).await? {
                println!(
                    "{} {} [{}] {}",
                    document.id,
                    document.name,
                    DocumentValidity::of(&document, now).label(),
                    document
                        .expiration_date
                        .map_or("-".to_string(), |d| d.format("%Y-%m-%d").to_string())
                );
            }
        }
        DocumentCommand::Analyze { file } => {
            let path = Path::new(&file);
            let upload = FileUpload {
                filename: path
                    .file_name()
                    .map_or(file.clone(), |n| n.to_string_lossy().to_string()),
                mime_type: mime_type(path).to_string(),
                bytes: LocalStorage::new(".").read_file(&file).await?,
            };
            let analysis = documents.analyze(upload).await?;
            println!("🤖 {}", analysis.name);
            println!(
                "   Expires: {}",
                if analysis.no_expiration {
                    "never".to_string()
                } else {
                    analysis
                        .expiration_date
                        .map_or("-".to_string(), |d| d.to_string())
                }
            );
            if !analysis.notes.is_empty() {
                println!("   {}", analysis.notes);
            }
        }
    }
    Ok(())
}

async fn routes(client: ApiClient, output: &LocalStorage, command: RouteCommand) -> Result<()> {
    let routes = RouteService::new(client);
    match command {
        RouteCommand::List { boat, date } => {
            let list = routes.list(boat).await?;
            for route in list
                .iter()
                .filter(|r| date.is_none() || r.start_day() == date)
            {
                let points: Vec<_> = route.points.iter().map(|p| TrackPoint::from(p).position()).collect();
                println!(
                    "{} {} {} {} points {:.2} nm",
                    route.id,
                    route.start_day().unwrap_or_else(|| "-".to_string()),
                    route.display_name(),
                    route.points.len(),
                    path_length_m(&points) / 1852.0
                );
            }
        }
        RouteCommand::Export {
            boat,
            route,
            format,
            server,
        } => {
            let stem = format!("route-{}", route);
            let file_name = if server {
                let format: ServerExport = format.parse()?;
                let body = routes.export(route, format).await?;
                let file_name = format!("{}.{}", stem, format.as_str());
                output.write_file(&file_name, body.as_bytes()).await?;
                file_name
            } else {
                let format: ExportFormat = format.parse()?;
                let saved = routes.get(boat, route).await?;
                let points: Vec<TrackPoint> = saved.points.iter().map(TrackPoint::from).collect();
                export::export_to(output, &stem, format, saved.name.as_deref(), &points).await?
            };
            println!("📁 Saved {}", output.resolve(&file_name).display());
        }
    }
    Ok(())
}

async fn record(client: ApiClient, config: &ClientConfig, args: RecordArgs) -> Result<()> {
    let data = LocalStorage::new(".").read_file(&args.fixes).await?;
    let geolocation = Arc::new(ReplayGeolocation::from_json(&data)?);
    if geolocation.is_empty() {
        return Err(MarinexError::Validation {
            message: format!("{} contains no fixes", args.fixes),
        });
    }

    let mut tracking = config.tracking.clone();
    if let Some(interval) = args.interval_ms {
        tracking.sample_interval_ms = interval;
    }

    let routes = Arc::new(RouteService::new(client));
    let mut book = Logbook::new(
        args.boat,
        routes,
        Arc::clone(&geolocation),
        Arc::new(SystemClock),
        &tracking,
    )?;

    // 先開始錄製再啟動 GPS，第一個 fix 才不會漏掉
    book.start_recording(false)?;
    book.set_mode(Mode::Live).await?;
    println!("⏺️  Replaying {} fixes", geolocation.len());
    geolocation.finished().await;

    let route = book.save_live_route(&args.name).await?;
    println!("💾 Saved route {} ({})", route.display_name(), route.id);
    Ok(())
}
