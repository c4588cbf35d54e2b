use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub mercadopago_base_url: String,
    pub mercadopago_access_token: String,
    pub notification_host: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            mercadopago_base_url: env::var("MERCADOPAGO_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("MERCADOPAGO_BASE_URL not set, using default");
                    "https://api.mercadopago.com".to_string()
                }),
            mercadopago_access_token: env::var("MERCADOPAGO_ACCESS_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("MERCADOPAGO_ACCESS_TOKEN not set, using empty value");
                    String::new()
                }),
            notification_host: env::var("NOTIFICATION_HOST")
                .unwrap_or_else(|_| {
                    warn!("NOTIFICATION_HOST not set, using default");
                    "http://localhost:3000".to_string()
                }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn is_payments_configured(&self) -> bool {
        !self.mercadopago_access_token.is_empty()
    }
}
