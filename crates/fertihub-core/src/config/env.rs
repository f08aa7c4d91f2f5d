use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_server();
        self.apply_env_overrides_ai();
        self.apply_env_overrides_storage();
    }

    fn apply_env_overrides_server(&mut self) {
        if let Ok(v) = std::env::var("FERTIHUB_BIND") {
            self.server.bind = v;
        }
        if let Ok(v) = std::env::var("FERTIHUB_PORT") {
            if let Ok(port) = v.parse::<u16>() {
                self.server.port = port;
            } else {
                tracing::warn!("ignoring invalid FERTIHUB_PORT value: {v}");
            }
        }
        if let Ok(v) = std::env::var("FERTIHUB_AUTH_TOKEN") {
            self.server.auth_token = Some(v).filter(|t| !t.is_empty());
        }
        if let Ok(v) = std::env::var("FERTIHUB_RATE_LIMIT") {
            if let Ok(rate) = v.parse::<u32>() {
                self.server.rate_limit = rate;
            } else {
                tracing::warn!("ignoring invalid FERTIHUB_RATE_LIMIT value: {v}");
            }
        }
        if let Ok(v) = std::env::var("DATABASE_URL") {
            self.database.url = v;
        }
    }

    fn apply_env_overrides_ai(&mut self) {
        if let Ok(v) = std::env::var("FERTIHUB_AI_PROVIDER") {
            if let Ok(kind) = v.parse() {
                self.ai.default_provider = kind;
            } else {
                tracing::warn!("ignoring invalid FERTIHUB_AI_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("FERTIHUB_AI_FALLBACK") {
            if let Ok(enabled) = v.parse::<bool>() {
                self.ai.fallback_enabled = enabled;
            } else {
                tracing::warn!("ignoring invalid FERTIHUB_AI_FALLBACK value: {v}");
            }
        }
        if let Ok(v) = std::env::var("FERTIHUB_GROQ_MODEL") {
            self.ai.groq.model = v;
        }
        if let Ok(v) = std::env::var("FERTIHUB_GEMINI_MODEL") {
            self.ai.gemini.model = v;
        }
    }

    fn apply_env_overrides_storage(&mut self) {
        if let Ok(v) = std::env::var("R2_ENDPOINT_URL") {
            self.storage.endpoint = Some(v).filter(|e| !e.is_empty());
        }
        if let Ok(v) = std::env::var("R2_BUCKET_NAME")
            && !v.is_empty()
        {
            self.storage.bucket = v;
        }
        if let Ok(v) = std::env::var("R2_PUBLIC_URL") {
            self.storage.public_url = Some(v).filter(|u| !u.is_empty());
        }
    }
}
