use std::{
    path::PathBuf,
    sync::atomic::{AtomicBool, Ordering},
    sync::Arc,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use payment_ui::{PaymentUiOptions, PaymentUiSession};
use shared::domain::{days_between, CompletionReason, DeviceId, PlanDescriptor};
use tracing::{info, warn};
use welcome_core::{
    assets::{mode_from_query, FsAssetResolver, WelcomeAssetLoader},
    HttpPaymentGateway, PageOrigin, PaymentStep, PaymentStepProps, PaymentStepView,
    PaymentUiProvider, WelcomeHost,
};

mod config;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    backend_url: Option<String>,
    #[arg(long)]
    page_url: Option<String>,
    #[arg(long)]
    asset_root: Option<PathBuf>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    device_id: Option<String>,
    /// Page query string of the wizard window, e.g. "mode=OnlyPayment".
    #[arg(long, default_value = "mode=Complete")]
    query: String,
    /// Trial start date (YYYY-MM-DD) used to compute remaining trial days.
    #[arg(long)]
    trial_started: Option<String>,
}

struct AutoConfirmPaymentUi;

struct AutoConfirmSession {
    attached: AtomicBool,
}

#[async_trait]
impl PaymentUiSession for AutoConfirmSession {
    async fn confirm(&self, return_url: &str) -> Result<()> {
        info!("payment-ui: headless confirm return_url={return_url}");
        Ok(())
    }

    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentUiProvider for AutoConfirmPaymentUi {
    async fn mount_form(&self, options: PaymentUiOptions) -> Result<Arc<dyn PaymentUiSession>> {
        info!("payment-ui: headless mount container={}", options.container);
        Ok(Arc::new(AutoConfirmSession {
            attached: AtomicBool::new(true),
        }))
    }
}

struct ConsoleHost;

#[async_trait]
impl WelcomeHost for ConsoleHost {
    async fn finish(&self, reason: CompletionReason) -> Result<()> {
        println!("Wizard finished: reason={reason}");
        Ok(())
    }

    fn back(&self) {
        println!("Wizard step back requested.");
    }
}

fn demo_plan(trial_started: Option<&str>) -> Result<PlanDescriptor> {
    let trial_days_total = 14;
    let days_used = match trial_started {
        Some(raw) => {
            let start = raw
                .parse::<NaiveDate>()
                .context("invalid --trial-started date, expected YYYY-MM-DD")?
                .and_hms_opt(0, 0, 0)
                .context("invalid trial start time")?
                .and_utc();
            days_between(start, Utc::now())
        }
        None => 1,
    };
    Ok(PlanDescriptor {
        trial: true,
        trial_days_total,
        trial_days_left: (trial_days_total - days_used + 1).max(0),
        monthly_price: "$2.99".to_string(),
        yearly_price: "$19.99".to_string(),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();
    let settings = config::load_settings();

    let backend_url = args.backend_url.unwrap_or(settings.backend_url);
    let page_url = args.page_url.unwrap_or(settings.page_url);
    let asset_root = args.asset_root.unwrap_or(settings.asset_root);
    let device_id = args
        .device_id
        .map(DeviceId::new)
        .unwrap_or_else(DeviceId::random);

    let loader = WelcomeAssetLoader::new(Arc::new(FsAssetResolver::new(asset_root)));
    match loader.load(&args.query).await {
        Ok(page) => {
            println!("Welcome mode: {:?}", page.mode);
            println!("App icon: {}", page.assets.app_icon);
            println!("Hero image: {}", page.assets.hero);
        }
        Err(err) => {
            warn!("assets: welcome page load failed error={err:#}");
        }
    }

    let plan = demo_plan(args.trial_started.as_deref())?;
    println!(
        "Plan: trial={} days_left={}/{} monthly={} yearly={}",
        plan.trial, plan.trial_days_left, plan.trial_days_total, plan.monthly_price, plan.yearly_price
    );
    println!("Device: {device_id}");

    let props = PaymentStepProps {
        plan,
        email: args.email,
        device_id,
        mode: mode_from_query(&args.query),
    };
    let origin = PageOrigin::from_page_url(&page_url)?;

    let step = PaymentStep::new_with_dependencies(
        props,
        origin,
        Arc::new(HttpPaymentGateway::new(backend_url)),
        Arc::new(AutoConfirmPaymentUi),
        Arc::new(ConsoleHost),
    );

    step.load().await;
    let snapshot = step.snapshot().await;
    println!(
        "Payment step ready: label={} loading={}",
        snapshot.next_label, snapshot.loading
    );

    match &snapshot.view {
        PaymentStepView::LoadFailed { reason } => {
            println!("Setup fetch failed ({reason}); run again once the backend is reachable.");
            return Ok(());
        }
        PaymentStepView::Unsupported { status } => {
            println!("Unsupported billing status '{status}'; contact support to finish setup.");
            return Ok(());
        }
        view => {
            println!("View: {view:?}");
        }
    }

    step.advance().await?;

    if snapshot.view == PaymentStepView::CollectPaymentMethod {
        let confirmed = step.snapshot().await;
        println!(
            "Confirmation done: label={} loading={}",
            confirmed.next_label, confirmed.loading
        );
        step.advance().await?;
    }

    Ok(())
}
