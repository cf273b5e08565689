use parking_lot::RwLock;
use serde_json::json;
use tracing::{info, instrument};

use voyage_core::models::TravelPlan;
use voyage_core::{format_as_text, share_link, PlanTemplate};

use crate::error::{ProviderError, Result};

const KAKAO_AUTHORIZE_URL: &str = "https://kauth.kakao.com/oauth/authorize";
const KAKAO_TOKEN_URL: &str = "https://kauth.kakao.com/oauth/token";
const KAKAO_MEMO_URL: &str = "https://kapi.kakao.com/v2/api/talk/memo/default/send";
const KAKAO_SCOPE: &str = "profile_nickname,talk_message";
const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/callback";

/// Everything the user needs to complete an OAuth round trip by hand:
/// the browser URL plus step-by-step Korean instructions.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthChallenge {
    pub auth_url: String,
    pub instructions: Vec<String>,
}

pub trait ShareProvider: Send + Sync {
    fn is_authenticated(&self) -> bool;
    fn begin_auth(&self) -> Result<AuthChallenge>;
    async fn complete_auth(&self, code: &str) -> Result<()>;
    async fn send_plan(&self, plan: &TravelPlan) -> Result<()>;
}

/// KakaoTalk self-memo sender. Authentication happens lazily: the first share
/// attempt without a token yields an [`AuthChallenge`] upstream.
pub struct KakaoShare {
    client: reqwest::Client,
    rest_api_key: String,
    redirect_uri: String,
    access_token: RwLock<Option<String>>,
}

impl KakaoShare {
    pub fn new(rest_api_key: String, redirect_uri: String, access_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            rest_api_key,
            redirect_uri,
            access_token: RwLock::new(access_token),
        }
    }

    pub fn from_env() -> Result<Self> {
        let rest_api_key = std::env::var("KAKAO_REST_API_KEY")
            .map_err(|_| ProviderError::MissingConfig("KAKAO_REST_API_KEY"))?;
        let redirect_uri = std::env::var("KAKAO_REDIRECT_URI")
            .unwrap_or_else(|_| DEFAULT_REDIRECT_URI.to_string());
        let access_token = std::env::var("KAKAO_ACCESS_TOKEN").ok();
        Ok(Self::new(rest_api_key, redirect_uri, access_token))
    }

    fn authorize_url(&self) -> String {
        format!(
            "{KAKAO_AUTHORIZE_URL}?client_id={}&redirect_uri={}&response_type=code&scope={KAKAO_SCOPE}",
            self.rest_api_key, self.redirect_uri
        )
    }
}

impl ShareProvider for KakaoShare {
    fn is_authenticated(&self) -> bool {
        self.access_token.read().is_some()
    }

    fn begin_auth(&self) -> Result<AuthChallenge> {
        Ok(AuthChallenge {
            auth_url: self.authorize_url(),
            instructions: vec![
                "아래 링크를 브라우저에서 열어주세요.".to_string(),
                "카카오 계정으로 로그인하고 권한을 허용해주세요.".to_string(),
                format!("{} 주소로 이동하면 URL의 code 값을 복사해주세요.", self.redirect_uri),
                "복사한 인증 코드를 여기에 붙여넣어 주세요.".to_string(),
            ],
        })
    }

    #[instrument(skip(self, code))]
    async fn complete_auth(&self, code: &str) -> Result<()> {
        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", self.rest_api_key.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("code", code),
        ];

        let response = self.client.post(KAKAO_TOKEN_URL).form(&form).send().await?;
        let status = response.status();
        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|err| ProviderError::InvalidResponse(format!("bad token JSON: {err}")))?;

        if !status.is_success() {
            let message = payload
                .get("error_description")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("token exchange failed")
                .to_string();
            return Err(ProviderError::Auth(message));
        }

        let token = payload
            .get("access_token")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| ProviderError::Auth("no access_token in response".to_string()))?;

        *self.access_token.write() = Some(token.to_string());
        info!("kakao access token acquired");
        Ok(())
    }

    #[instrument(skip(self, plan), fields(plan_id = %plan.id))]
    async fn send_plan(&self, plan: &TravelPlan) -> Result<()> {
        let token = self
            .access_token
            .read()
            .clone()
            .ok_or_else(|| ProviderError::Auth("not authenticated".to_string()))?;

        let template = json!({
            "object_type": "text",
            "text": share_message(plan),
            "link": {
                "web_url": share_link(plan),
                "mobile_web_url": share_link(plan),
            },
            "button_title": "여행 계획 보기",
        });
        let form = [("template_object", template.to_string())];

        let response = self
            .client
            .post(KAKAO_MEMO_URL)
            .bearer_auth(&token)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            *self.access_token.write() = None;
            return Err(ProviderError::Auth("access token expired".to_string()));
        }
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        info!("plan shared to kakao self-memo");
        Ok(())
    }
}

/// Message body sent to the chat app: the simple text rendering plus the
/// share link (the link also rides in the template button).
pub fn share_message(plan: &TravelPlan) -> String {
    format!(
        "{}\n\n🔗 {}",
        format_as_text(plan, PlanTemplate::Simple),
        share_link(plan)
    )
}

/// Records outgoing messages instead of calling out; always authenticated.
#[derive(Default)]
pub struct OfflineShare {
    sent: RwLock<Vec<String>>,
}

impl OfflineShare {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_messages(&self) -> Vec<String> {
        self.sent.read().clone()
    }
}

impl ShareProvider for OfflineShare {
    fn is_authenticated(&self) -> bool {
        true
    }

    fn begin_auth(&self) -> Result<AuthChallenge> {
        Ok(AuthChallenge {
            auth_url: String::new(),
            instructions: vec!["오프라인 모드에서는 인증이 필요하지 않아요.".to_string()],
        })
    }

    async fn complete_auth(&self, _code: &str) -> Result<()> {
        Ok(())
    }

    async fn send_plan(&self, plan: &TravelPlan) -> Result<()> {
        self.sent.write().push(share_message(plan));
        Ok(())
    }
}

/// Runtime-selected share backend.
pub enum Share {
    Kakao(KakaoShare),
    Offline(OfflineShare),
}

impl Share {
    pub fn offline() -> Self {
        Self::Offline(OfflineShare::new())
    }

    /// Kakao-backed when `KAKAO_REST_API_KEY` is present, offline otherwise.
    pub fn from_env() -> Self {
        match KakaoShare::from_env() {
            Ok(kakao) => Self::Kakao(kakao),
            Err(_) => Self::Offline(OfflineShare::new()),
        }
    }
}

impl ShareProvider for Share {
    fn is_authenticated(&self) -> bool {
        match self {
            Share::Kakao(kakao) => kakao.is_authenticated(),
            Share::Offline(offline) => offline.is_authenticated(),
        }
    }

    fn begin_auth(&self) -> Result<AuthChallenge> {
        match self {
            Share::Kakao(kakao) => kakao.begin_auth(),
            Share::Offline(offline) => offline.begin_auth(),
        }
    }

    async fn complete_auth(&self, code: &str) -> Result<()> {
        match self {
            Share::Kakao(kakao) => kakao.complete_auth(code).await,
            Share::Offline(offline) => offline.complete_auth(code).await,
        }
    }

    async fn send_plan(&self, plan: &TravelPlan) -> Result<()> {
        match self {
            Share::Kakao(kakao) => kakao.send_plan(plan).await,
            Share::Offline(offline) => offline.send_plan(plan).await,
        }
    }
}
