use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use never_miss::api::BackendApi;
use never_miss::bridge::StaticBridge;
use never_miss::client::{ReqwestTransport, RequestClient};
use never_miss::config::{self, Config};
use never_miss::controller::Banner;
use never_miss::download::DirectorySink;
use never_miss::gid::ProductId;
use never_miss::model::ButtonType;
use never_miss::pages::coming_soon::{ComingSoonList, ComingSoonSettings, SettingsTarget};
use never_miss::pages::notify_me::{NotifyMeEdit, NotifyMeForm, NotifyMePage};
use never_miss::pages::pre_order::PreOrderPage;
use never_miss::pages::reports::ReportsPage;
use never_miss::pages::sold_out::{SoldOutForm, SoldOutPage};
use never_miss::telemetry;

#[derive(Debug, Parser)]
#[command(author, version, about = "Manage Never Miss storefront settings for a shop")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send the install ping and exit
    Init,
    /// Coming-soon countdowns per product
    #[command(subcommand)]
    ComingSoon(ComingSoonCmd),
    /// Storefront "Notify Me" toggle for sold out items
    #[command(subcommand)]
    SoldOut(SoldOutCmd),
    /// Notify-me button and form styling
    #[command(subcommand)]
    NotifyMe(NotifyMeCmd),
    /// Products open for pre-order
    #[command(subcommand)]
    PreOrder(PreOrderCmd),
    /// Notify-me subscription reports
    #[command(subcommand)]
    Reports(ReportsCmd),
}

#[derive(Debug, Subcommand)]
enum ComingSoonCmd {
    List,
    Show {
        /// Product id, GID or product_<id> key
        product: String,
    },
    Set(ComingSoonSet),
}

#[derive(Debug, ClapArgs)]
struct ComingSoonSet {
    product: String,
    /// Product title, used when the product is not configured yet
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    start_date: String,
    #[arg(long)]
    start_time: String,
    #[arg(long)]
    end_date: String,
    #[arg(long)]
    end_time: String,
    #[arg(long)]
    notify_me: Option<bool>,
}

#[derive(Debug, Subcommand)]
enum SoldOutCmd {
    Show,
    Set {
        #[arg(long)]
        enabled: bool,
    },
}

#[derive(Debug, Subcommand)]
enum NotifyMeCmd {
    Show,
    Set(NotifyMeSet),
}

#[derive(Debug, ClapArgs)]
struct NotifyMeSet {
    #[arg(long)]
    enabled: Option<bool>,
    #[arg(long)]
    custom_button: Option<bool>,
    #[arg(long)]
    button_text: Option<String>,
    #[arg(long)]
    button_color: Option<String>,
    #[arg(long)]
    text_color: Option<String>,
    /// rounded or sharp
    #[arg(long)]
    button_type: Option<String>,
    #[arg(long)]
    heading: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    form_button_text: Option<String>,
}

#[derive(Debug, Subcommand)]
enum PreOrderCmd {
    Show,
    /// Add products to the pre-order selection
    Add { products: Vec<String> },
    Remove { products: Vec<String> },
    /// List store products
    Catalog {
        #[arg(long)]
        search: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum ReportsCmd {
    List {
        #[arg(long, default_value = "1")]
        page: u32,
    },
    /// Download subscriptions as CSV (defaults to month to date)
    Export {
        #[arg(long, default_value = "")]
        start: String,
        #[arg(long, default_value = "")]
        end: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))
        .with_context(|| format!("loading {}", args.config.display()))?;
    cfg.ensure_dirs()?;

    let bridge = Arc::new(StaticBridge::from_config(&cfg));
    let transport = Arc::new(ReqwestTransport::new(&cfg.backend.user_agent)?);
    let client = RequestClient::new(transport, bridge.clone());
    let api = Arc::new(BackendApi::from_config(client, &cfg)?);

    if let Command::Init = args.command {
        telemetry::spawn_announce(api.clone()).await?;
        info!(shop = api.shop_domain(), "init ping sent");
        return Ok(());
    }
    let ping = telemetry::spawn_announce(api.clone());

    match args.command {
        Command::Init => {}
        Command::ComingSoon(cmd) => coming_soon(&cfg, api, cmd).await?,
        Command::SoldOut(cmd) => sold_out(&cfg, api, cmd).await?,
        Command::NotifyMe(cmd) => notify_me(&cfg, api, cmd).await?,
        Command::PreOrder(cmd) => pre_order(api, &bridge, cmd).await?,
        Command::Reports(cmd) => reports(&cfg, api, cmd).await?,
    }

    // let the ping finish rather than cutting it off at exit
    let _ = ping.await;
    Ok(())
}

fn print_banner(banner: Option<&Banner>) {
    if let Some(b) = banner {
        println!("[{:?}] {}: {}", b.tone, b.title, b.description);
    }
}

async fn coming_soon(cfg: &Config, api: Arc<BackendApi>, cmd: ComingSoonCmd) -> Result<()> {
    let mut list = ComingSoonList::new(api.clone());
    list.refresh().await;

    match cmd {
        ComingSoonCmd::List => {
            for e in list.entries() {
                println!("{}\t{}\t{}", e.product, e.status.label(), e.title);
            }
        }
        ComingSoonCmd::Show { product } => {
            let product = ProductId::parse(&product)?;
            let Some(target) = list.open(product) else {
                println!("{product} has no coming soon settings");
                return Ok(());
            };
            let page = ComingSoonSettings::open(api, &target, cfg.utc_offset());
            println!("{:#?}", page.draft());
        }
        ComingSoonCmd::Set(set) => {
            let product = ProductId::parse(&set.product)?;
            let target = list.open(product).unwrap_or_else(|| SettingsTarget {
                product,
                title: set.title.clone().unwrap_or_default(),
                image_url: None,
                existing: None,
            });
            let mut page = ComingSoonSettings::open(api, &target, cfg.utc_offset())
                .with_banner_ttl(cfg.banner_ttl());
            if target.existing.is_none() {
                page.load().await;
            }
            page.set_start(&set.start_date, &set.start_time)?;
            page.set_end(&set.end_date, &set.end_time)?;
            if let Some(enabled) = set.notify_me {
                page.set_notify_me(enabled);
            }
            let result = page.save().await;
            print_banner(page.banner());
            result?;
        }
    }
    Ok(())
}

async fn sold_out(cfg: &Config, api: Arc<BackendApi>, cmd: SoldOutCmd) -> Result<()> {
    let mut page = SoldOutPage::new(api, SoldOutForm).with_banner_ttl(cfg.banner_ttl());
    page.load().await;
    match cmd {
        SoldOutCmd::Show => {
            println!("notify me enabled: {}", page.notify_me_enabled().unwrap_or(false));
        }
        SoldOutCmd::Set { enabled } => {
            page.set_notify_me(enabled);
            if !page.can_save() {
                println!("nothing to save");
                return Ok(());
            }
            let result = page.save().await;
            print_banner(page.banner());
            result?;
        }
    }
    Ok(())
}

async fn notify_me(cfg: &Config, api: Arc<BackendApi>, cmd: NotifyMeCmd) -> Result<()> {
    let mut page = NotifyMePage::new(api, NotifyMeForm).with_banner_ttl(cfg.banner_ttl());
    page.load().await;
    let set = match cmd {
        NotifyMeCmd::Show => {
            println!("{:#?}", page.draft());
            return Ok(());
        }
        NotifyMeCmd::Set(set) => set,
    };

    let button_type = match set.button_type.as_deref() {
        None => None,
        Some("rounded") => Some(ButtonType::Rounded),
        Some("sharp") => Some(ButtonType::Sharp),
        Some(other) => bail!("unknown button type {other:?}, expected rounded or sharp"),
    };
    // toggles first so the controls they unlock accept edits
    let edits = [
        set.enabled.map(NotifyMeEdit::Enabled),
        set.custom_button.map(NotifyMeEdit::CustomButton),
        set.button_text.map(NotifyMeEdit::ButtonText),
        set.button_color.map(NotifyMeEdit::ButtonColor),
        set.text_color.map(NotifyMeEdit::TextColor),
        button_type.map(NotifyMeEdit::ButtonType),
        set.heading.map(NotifyMeEdit::FormHeading),
        set.description.map(NotifyMeEdit::FormDescription),
        set.form_button_text.map(NotifyMeEdit::FormButtonText),
    ];
    for edit in edits.into_iter().flatten() {
        let label = format!("{edit:?}");
        if !page.apply(edit) {
            println!("skipped {label}: control is disabled");
        }
    }
    if !page.can_save() {
        println!("nothing to save");
        return Ok(());
    }
    let result = page.save().await;
    print_banner(page.banner());
    result?;
    Ok(())
}

async fn pre_order(api: Arc<BackendApi>, bridge: &StaticBridge, cmd: PreOrderCmd) -> Result<()> {
    let mut page = PreOrderPage::new(api.clone());
    page.load().await;
    match cmd {
        PreOrderCmd::Show => {
            for p in page.selected() {
                println!("{}\t{}", p.product_id, p.title);
            }
        }
        PreOrderCmd::Catalog { search } => {
            page.load_catalog().await;
            print_banner(page.page_mut().banner());
            for p in page.filtered_catalog(search.as_deref().unwrap_or("")) {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    p.id, p.status, p.price, p.inventory_quantity, p.title
                );
            }
        }
        PreOrderCmd::Add { products } => {
            page.load_catalog().await;
            let mut picks = Vec::with_capacity(products.len());
            for raw in &products {
                let id = ProductId::parse(raw)?;
                let title = page
                    .catalog()
                    .iter()
                    .find(|p| p.id == id)
                    .map(|p| p.title.clone())
                    .unwrap_or_default();
                picks.push(json!({ "id": id.to_gid(), "title": title }));
            }
            bridge.queue_pick(json!({ "selection": picks })).await;
            let added = page.pick_products().await?;
            println!("{added} product(s) added");
            if added > 0 {
                let result = page.save().await;
                print_banner(page.page_mut().banner());
                result?;
            }
        }
        PreOrderCmd::Remove { products } => {
            let mut removed = 0;
            for raw in &products {
                if page.remove(ProductId::parse(raw)?) {
                    removed += 1;
                }
            }
            println!("{removed} product(s) removed");
            if removed > 0 {
                let result = page.save().await;
                print_banner(page.page_mut().banner());
                result?;
            }
        }
    }
    Ok(())
}

async fn reports(cfg: &Config, api: Arc<BackendApi>, cmd: ReportsCmd) -> Result<()> {
    let today = chrono::Utc::now()
        .with_timezone(&cfg.utc_offset())
        .date_naive();
    let sink = Arc::new(DirectorySink::new(&cfg.app.download_dir));
    let mut page = ReportsPage::new(api, sink, cfg.reports.page_size, today)
        .with_banner_ttl(cfg.banner_ttl());
    match cmd {
        ReportsCmd::List { page: n } => {
            page.load(n).await;
            for row in page.rows() {
                println!(
                    "{}\t{}\t{}\t{}",
                    row.created_at,
                    row.email,
                    row.product_title,
                    page.product_admin_url(row).unwrap_or_else(|| "-".into())
                );
            }
            let p = page.pagination();
            println!(
                "page {} (limit {}){}{}",
                p.page,
                p.limit,
                if page.has_previous() { ", has previous" } else { "" },
                if page.has_next() { ", has next" } else { "" },
            );
        }
        ReportsCmd::Export { start, end } => {
            page.set_export_range(&start, &end)?;
            let result = page.export().await;
            print_banner(page.banner());
            let path = result?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
