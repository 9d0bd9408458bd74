use std::{fmt, sync::Arc};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use payment_ui::{PaymentUiConnector, PaymentUiMount, PaymentUiOptions, PaymentUiSession};
use reqwest::Client;
use shared::{
    domain::{CompletionReason, DeviceId, PaymentStatus, PlanDescriptor, WelcomeMode},
    error::{ApiError, ApiException},
    protocol::{BeginSetupRequest, BeginSetupResponse},
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};
use url::Url;

pub mod assets;

const PAYMENT_CONTAINER_SELECTOR: &str = "#payment-element";
const WELCOME_PATH: &str = "/welcome";

type SharedSetup = Shared<BoxFuture<'static, std::result::Result<Arc<PaymentSetup>, SetupError>>>;

#[derive(Debug, Clone, Error)]
pub enum SetupError {
    #[error("payment setup request failed: {0}")]
    Gateway(String),
    #[error("payment provider returned no client secret for status {status}")]
    MissingClientSecret { status: String },
    #[error("failed to mount hosted payment form: {0}")]
    Mount(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn begin_setup(&self, request: BeginSetupRequest) -> Result<BeginSetupResponse>;
}

pub struct MissingPaymentGateway;

#[async_trait]
impl PaymentGateway for MissingPaymentGateway {
    async fn begin_setup(&self, _request: BeginSetupRequest) -> Result<BeginSetupResponse> {
        Err(anyhow!("payment gateway is unavailable"))
    }
}

#[async_trait]
pub trait PaymentUiProvider: Send + Sync {
    async fn mount_form(&self, options: PaymentUiOptions) -> Result<Arc<dyn PaymentUiSession>>;
}

pub struct MissingPaymentUi;

#[async_trait]
impl PaymentUiProvider for MissingPaymentUi {
    async fn mount_form(&self, _options: PaymentUiOptions) -> Result<Arc<dyn PaymentUiSession>> {
        Err(anyhow!("hosted payment ui is unavailable"))
    }
}

#[async_trait]
impl<T> PaymentUiProvider for T
where
    T: PaymentUiConnector,
{
    async fn mount_form(&self, options: PaymentUiOptions) -> Result<Arc<dyn PaymentUiSession>> {
        self.mount(options).await
    }
}

#[async_trait]
pub trait WelcomeHost: Send + Sync {
    async fn finish(&self, reason: CompletionReason) -> Result<()>;
    fn back(&self);
}

pub struct MissingWelcomeHost;

#[async_trait]
impl WelcomeHost for MissingWelcomeHost {
    async fn finish(&self, reason: CompletionReason) -> Result<()> {
        Err(anyhow!("welcome host is unavailable reason={reason}"))
    }

    fn back(&self) {
        warn!("welcome: host is unavailable, ignoring back request");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NextLabel {
    #[default]
    Next,
    Done,
    Finish,
}

impl NextLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Next => "Next",
            Self::Done => "Done",
            Self::Finish => "Finish",
        }
    }
}

impl fmt::Display for NextLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one setup fetch. The hosted form handle only exists in the
/// branch that renders it; dropping the outcome detaches the form.
pub enum PaymentSetup {
    Succeeded,
    RequiresCapture,
    RequiresPaymentMethod { form: PaymentUiMount },
    Unsupported { status: String },
}

impl PaymentSetup {
    pub fn status(&self) -> PaymentStatus {
        match self {
            Self::Succeeded => PaymentStatus::Succeeded,
            Self::RequiresCapture => PaymentStatus::RequiresCapture,
            Self::RequiresPaymentMethod { .. } => PaymentStatus::RequiresPaymentMethod,
            Self::Unsupported { status } => PaymentStatus::Other(status.clone()),
        }
    }

    fn next_label(&self) -> NextLabel {
        match self {
            Self::Succeeded => NextLabel::Finish,
            Self::RequiresCapture => NextLabel::Done,
            Self::RequiresPaymentMethod { .. } | Self::Unsupported { .. } => NextLabel::Next,
        }
    }

    fn view(&self) -> PaymentStepView {
        match self {
            Self::Succeeded => PaymentStepView::SubscriptionActive,
            Self::RequiresCapture => PaymentStepView::CaptureScheduled,
            Self::RequiresPaymentMethod { .. } => PaymentStepView::CollectPaymentMethod,
            Self::Unsupported { status } => PaymentStepView::Unsupported {
                status: status.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStepView {
    Loading,
    SubscriptionActive,
    CaptureScheduled,
    CollectPaymentMethod,
    Unsupported { status: String },
    LoadFailed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSnapshot {
    pub loading: bool,
    pub next_label: NextLabel,
    pub view: PaymentStepView,
}

#[derive(Debug, Clone)]
pub struct PaymentStepProps {
    pub plan: PlanDescriptor,
    pub email: Option<String>,
    pub device_id: DeviceId,
    pub mode: WelcomeMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOrigin {
    scheme: String,
    host: String,
    port: Option<u16>,
}

impl PageOrigin {
    pub fn from_page_url(page_url: &str) -> Result<Self> {
        let url = Url::parse(page_url).with_context(|| format!("invalid page url: {page_url}"))?;
        let host = url
            .host_str()
            .ok_or_else(|| anyhow!("page url has no host: {page_url}"))?
            .to_string();
        Ok(Self {
            scheme: url.scheme().to_string(),
            host,
            port: url.port(),
        })
    }

    pub fn welcome_return_url(&self, mode: WelcomeMode) -> String {
        let authority = match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        };
        format!(
            "{}://{}{}?mode={}",
            self.scheme,
            authority,
            WELCOME_PATH,
            mode.as_query_value()
        )
    }
}

struct StepState {
    loading: bool,
    next_label: NextLabel,
    confirmed: bool,
    setup: Option<SharedSetup>,
}

pub struct PaymentStep {
    gateway: Arc<dyn PaymentGateway>,
    payment_ui: Arc<dyn PaymentUiProvider>,
    host: Arc<dyn WelcomeHost>,
    origin: PageOrigin,
    props: PaymentStepProps,
    inner: Mutex<StepState>,
}

impl PaymentStep {
    pub fn new(props: PaymentStepProps, origin: PageOrigin) -> Self {
        Self::new_with_dependencies(
            props,
            origin,
            Arc::new(MissingPaymentGateway),
            Arc::new(MissingPaymentUi),
            Arc::new(MissingWelcomeHost),
        )
    }

    pub fn new_with_dependencies(
        props: PaymentStepProps,
        origin: PageOrigin,
        gateway: Arc<dyn PaymentGateway>,
        payment_ui: Arc<dyn PaymentUiProvider>,
        host: Arc<dyn WelcomeHost>,
    ) -> Self {
        Self {
            gateway,
            payment_ui,
            host,
            origin,
            props,
            inner: Mutex::new(StepState {
                loading: false,
                next_label: NextLabel::Next,
                confirmed: false,
                setup: None,
            }),
        }
    }

    pub fn plan(&self) -> &PlanDescriptor {
        &self.props.plan
    }

    /// Starts (or restarts) the setup fetch and waits for it to settle.
    /// A failed fetch stays visible through `snapshot` so the render layer
    /// can offer a retry; calling `load` again starts over cleanly.
    pub async fn load(&self) {
        let setup = {
            let mut guard = self.inner.lock().await;
            guard.loading = true;
            guard.next_label = NextLabel::Next;
            guard.confirmed = false;
            let setup = self.spawn_setup_fetch();
            guard.setup = Some(setup.clone());
            setup
        };

        info!(
            "payment: setup fetch started device={} mode={} trial={}",
            self.props.device_id,
            self.props.mode.as_query_value(),
            self.props.plan.trial
        );

        match setup.await {
            Ok(outcome) => {
                let label = outcome.next_label();
                let mut guard = self.inner.lock().await;
                guard.loading = false;
                guard.next_label = label;
                info!(
                    "payment: setup fetch resolved status={} label={}",
                    outcome.status(),
                    label
                );
            }
            Err(err) => {
                let mut guard = self.inner.lock().await;
                guard.loading = false;
                warn!("payment: setup fetch failed error={err}");
            }
        }
    }

    /// Drives the step forward on a Next/Done/Finish press. Waits for an
    /// in-flight fetch, so pressing the button during load is ordering,
    /// not an error.
    pub async fn advance(&self) -> Result<()> {
        let (setup, confirmed) = {
            let guard = self.inner.lock().await;
            let setup = guard
                .setup
                .clone()
                .ok_or_else(|| anyhow!("payment step not loaded"))?;
            (setup, guard.confirmed)
        };

        let outcome = setup.await.context("payment setup unavailable")?;

        if confirmed {
            return self.finish(CompletionReason::PaymentConfirmed).await;
        }

        match &*outcome {
            PaymentSetup::Succeeded => {
                self.finish(CompletionReason::SubscriptionActive).await?;
            }
            PaymentSetup::RequiresCapture => {
                self.finish(CompletionReason::CapturePending).await?;
            }
            PaymentSetup::RequiresPaymentMethod { form } => {
                {
                    let mut guard = self.inner.lock().await;
                    guard.loading = true;
                }
                let return_url = self.origin.welcome_return_url(WelcomeMode::OnlyPayment);
                match form.confirm(&return_url).await {
                    Ok(()) => {
                        let mut guard = self.inner.lock().await;
                        guard.loading = false;
                        guard.next_label = NextLabel::Finish;
                        guard.confirmed = true;
                        info!("payment: confirmation accepted return_url={return_url}");
                    }
                    Err(err) => {
                        {
                            let mut guard = self.inner.lock().await;
                            guard.loading = false;
                        }
                        warn!("payment: confirmation failed error={err}");
                        return Err(err.context("payment confirmation failed"));
                    }
                }
            }
            PaymentSetup::Unsupported { status } => {
                warn!("payment: advance ignored for unsupported status status={status}");
            }
        }

        Ok(())
    }

    pub fn back(&self) {
        info!("payment: step back requested");
        self.host.back();
    }

    pub async fn snapshot(&self) -> StepSnapshot {
        let guard = self.inner.lock().await;
        let view = match &guard.setup {
            None => PaymentStepView::Loading,
            Some(setup) => match setup.peek() {
                None => PaymentStepView::Loading,
                Some(Ok(outcome)) => outcome.view(),
                Some(Err(err)) => PaymentStepView::LoadFailed {
                    reason: err.to_string(),
                },
            },
        };
        StepSnapshot {
            loading: guard.loading,
            next_label: guard.next_label,
            view,
        }
    }

    async fn finish(&self, reason: CompletionReason) -> Result<()> {
        info!("payment: wizard finished reason={reason}");
        self.host.finish(reason).await
    }

    fn spawn_setup_fetch(&self) -> SharedSetup {
        let gateway = Arc::clone(&self.gateway);
        let payment_ui = Arc::clone(&self.payment_ui);
        let request = BeginSetupRequest {
            email: self.props.email.clone(),
            device_id: self.props.device_id.clone(),
        };
        async move {
            let response = gateway
                .begin_setup(request)
                .await
                .map_err(|err| SetupError::Gateway(err.to_string()))?;
            let outcome = resolve_setup(payment_ui, response).await?;
            Ok(Arc::new(outcome))
        }
        .boxed()
        .shared()
    }
}

async fn resolve_setup(
    payment_ui: Arc<dyn PaymentUiProvider>,
    response: BeginSetupResponse,
) -> std::result::Result<PaymentSetup, SetupError> {
    let BeginSetupResponse {
        status,
        client_secret,
    } = response;

    match PaymentStatus::from_wire(&status) {
        PaymentStatus::Succeeded => Ok(PaymentSetup::Succeeded),
        PaymentStatus::RequiresCapture => Ok(PaymentSetup::RequiresCapture),
        PaymentStatus::RequiresPaymentMethod => {
            let client_secret =
                client_secret.ok_or(SetupError::MissingClientSecret { status })?;
            let session = payment_ui
                .mount_form(PaymentUiOptions {
                    client_secret,
                    container: PAYMENT_CONTAINER_SELECTOR.to_string(),
                })
                .await
                .map_err(|err| SetupError::Mount(err.to_string()))?;
            info!("payment: hosted form mounted container={PAYMENT_CONTAINER_SELECTOR}");
            Ok(PaymentSetup::RequiresPaymentMethod {
                form: PaymentUiMount::new(session),
            })
        }
        PaymentStatus::Other(raw) => {
            warn!("payment: unsupported setup status status={raw}");
            Ok(PaymentSetup::Unsupported { status: raw })
        }
    }
}

pub struct HttpPaymentGateway {
    http: Client,
    backend_url: String,
}

impl HttpPaymentGateway {
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            backend_url: backend_url.into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn begin_setup(&self, request: BeginSetupRequest) -> Result<BeginSetupResponse> {
        let response = self
            .http
            .post(format!("{}/billing/setup", self.backend_url))
            .json(&request)
            .send()
            .await
            .context("payment setup request failed")?;

        let status = response.status();
        if !status.is_success() {
            if let Ok(body) = response.json::<ApiError>().await {
                return Err(ApiException::from(body).into());
            }
            return Err(anyhow!("payment setup request failed with status {status}"));
        }

        let body: BeginSetupResponse = response
            .json()
            .await
            .context("invalid payment setup response")?;
        Ok(body)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
