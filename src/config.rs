use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub reset_token_ttl_minutes: i64,
    pub confirmation_token_ttl_minutes: i64,
}

impl SecurityConfig {
    pub fn reset_token_ttl(&self) -> time::Duration {
        time::Duration::minutes(self.reset_token_ttl_minutes)
    }

    pub fn confirmation_token_ttl(&self) -> time::Duration {
        time::Duration::minutes(self.confirmation_token_ttl_minutes)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmsConfig {
    pub base_url: String,
    pub api_token: String,
    pub sender: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub base_url: String,
    pub api_token: String,
    pub from_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyConfig {
    pub api_key: String,
    pub api_secret: String,
    pub scopes: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub public_base_url: String,
    pub security: SecurityConfig,
    pub sms: SmsConfig,
    pub mail: MailConfig,
    pub shopify: ShopifyConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let public_base_url =
            std::env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".into());
        let security = SecurityConfig {
            reset_token_ttl_minutes: std::env::var("RESET_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            confirmation_token_ttl_minutes: std::env::var("CONFIRMATION_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
        };
        let sms = SmsConfig {
            base_url: std::env::var("SMS_GATEWAY_URL")
                .unwrap_or_else(|_| "https://sms.gateway.local".into()),
            api_token: std::env::var("SMS_GATEWAY_TOKEN").unwrap_or_default(),
            sender: std::env::var("SMS_SENDER").unwrap_or_else(|_| "userbase".into()),
        };
        let mail = MailConfig {
            base_url: std::env::var("MAIL_GATEWAY_URL")
                .unwrap_or_else(|_| "https://mail.gateway.local".into()),
            api_token: std::env::var("MAIL_GATEWAY_TOKEN").unwrap_or_default(),
            from_address: std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| "no-reply@userbase.local".into()),
        };
        let shopify = ShopifyConfig {
            api_key: std::env::var("SHOPIFY_API_KEY").unwrap_or_default(),
            api_secret: std::env::var("SHOPIFY_API_SECRET").unwrap_or_default(),
            scopes: std::env::var("SHOPIFY_SCOPES")
                .unwrap_or_else(|_| "read_orders,read_products".into()),
            redirect_uri: std::env::var("SHOPIFY_REDIRECT_URI").unwrap_or_else(|_| {
                "http://localhost:8080/integrations/shopify/confirmation".into()
            }),
        };
        Ok(Self {
            database_url,
            public_base_url,
            security,
            sms,
            mail,
            shopify,
        })
    }
}
