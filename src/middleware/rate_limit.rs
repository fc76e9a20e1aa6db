// src/middleware/rate_limit.rs

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

// Limitador de janela fixa por IP para o signup. Vive na memória do
// processo: vale para uma instância única e zera no restart.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    counts: RwLock<HashMap<String, (u32, Instant)>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
            counts: RwLock::new(HashMap::new()),
        }
    }

    /// Conta uma tentativa da chave e responde se ela ainda está dentro
    /// do limite da janela atual.
    pub async fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now()).await
    }

    // Separado do relógio de verdade para ser testável.
    async fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut counts = self.counts.write().await;

        // Limpeza embutida: com o mapa grande, descarta janelas vencidas.
        if counts.len() > 1000 {
            let window = self.window;
            counts.retain(|_, (_, start)| now.duration_since(*start) <= window);
        }

        if let Some((count, window_start)) = counts.get_mut(key) {
            if now.duration_since(*window_start) > self.window {
                // Janela vencida: recomeça a contagem
                *count = 1;
                *window_start = now;
                true
            } else if *count >= self.max_requests {
                false
            } else {
                *count += 1;
                true
            }
        } else {
            counts.insert(key.to_string(), (1, now));
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bloqueia_acima_do_limite_na_mesma_janela() {
        let limiter = RateLimiter::new(3, 3600);
        let now = Instant::now();

        assert!(limiter.check_at("10.0.0.1", now).await);
        assert!(limiter.check_at("10.0.0.1", now).await);
        assert!(limiter.check_at("10.0.0.1", now).await);
        // A quarta tentativa dentro da janela é recusada.
        assert!(!limiter.check_at("10.0.0.1", now).await);
    }

    #[tokio::test]
    async fn chaves_diferentes_nao_interferem() {
        let limiter = RateLimiter::new(1, 3600);
        let now = Instant::now();

        assert!(limiter.check_at("10.0.0.1", now).await);
        assert!(limiter.check_at("10.0.0.2", now).await);
        assert!(!limiter.check_at("10.0.0.1", now).await);
    }

    #[tokio::test]
    async fn janela_vencida_reinicia_a_contagem() {
        let limiter = RateLimiter::new(1, 1);
        let start = Instant::now();

        assert!(limiter.check_at("10.0.0.1", start).await);
        assert!(!limiter.check_at("10.0.0.1", start).await);

        let later = start + Duration::from_secs(2);
        assert!(limiter.check_at("10.0.0.1", later).await);
    }
}
