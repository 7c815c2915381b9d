//! Synthetic Transaction Generator
//!
//! Publishes legitimate and suspicious transactions to NATS for exercising
//! the scoring service.
//!
//! Usage: transaction_generator [--dry-run] [nats_url] [subject] [count] [fraud_rate] [delay_ms]

use anyhow::Result;
use chrono::{Duration as ChronoDuration, Timelike, Utc};
use fraud_risk_scoring::config::LoggingConfig;
use fraud_risk_scoring::types::{Location, Transaction};
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

const SAFE_MERCHANTS: &[&str] = &["Amazon", "Walmart", "Target", "Starbucks", "McDonald's"];
const OTHER_MERCHANTS: &[&str] = &["Corner Shop", "City Books", "Bella Pizza", "Fresh Market"];
const PAYMENT_METHODS: &[&str] = &["credit_card", "debit_card", "digital_wallet"];
const RISKY_PAYMENT_METHODS: &[&str] = &["cryptocurrency", "prepaid_card", "gift_card"];

const HOME_CITIES: &[(&str, &str, f64, f64)] = &[
    ("USA", "New York", 40.7128, -74.0060),
    ("USA", "Chicago", 41.8781, -87.6298),
    ("USA", "San Francisco", 37.7749, -122.4194),
    ("Canada", "Toronto", 43.6532, -79.3832),
];

const SUSPICIOUS_CITIES: &[(&str, &str, f64, f64)] = &[
    ("Russia", "Moscow", 55.7558, 37.6173),
    ("Nigeria", "Lagos", 6.5244, 3.3792),
    ("Romania", "Bucharest", 44.4268, 26.1025),
    ("Unknown", "Unknown", 0.0, 0.0),
];

/// Random transaction source for a fixed pool of users
struct TransactionGenerator {
    rng: rand::rngs::ThreadRng,
    transaction_counter: u64,
}

impl TransactionGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            transaction_counter: 0,
        }
    }

    fn next_id(&mut self) -> String {
        self.transaction_counter += 1;
        format!("tx_{:012}", self.transaction_counter)
    }

    fn random_user(&mut self) -> String {
        format!("USER_{}", self.rng.gen_range(1000..1050))
    }

    fn location(&mut self, choices: &[(&str, &str, f64, f64)]) -> Location {
        let (country, city, lat, lng) = choices[self.rng.gen_range(0..choices.len())];
        let mut location = Location::new(country, city, lat, lng);
        location.ip_address = Some(format!(
            "{}.{}.{}.{}",
            self.rng.gen_range(1..255),
            self.rng.gen_range(0..255),
            self.rng.gen_range(0..255),
            self.rng.gen_range(1..255)
        ));
        location
    }

    /// Everyday purchase at a familiar merchant during waking hours
    fn generate_legitimate(&mut self) -> Transaction {
        let id = self.next_id();
        let user = self.random_user();
        let merchant = if self.rng.gen_bool(0.7) {
            self.random_choice(SAFE_MERCHANTS)
        } else {
            self.random_choice(OTHER_MERCHANTS)
        };
        let payment_method = self.random_choice(PAYMENT_METHODS);
        let location = self.location(HOME_CITIES);
        let amount = (self.rng.gen_range(5.0..400.0_f64) * 100.0).round() / 100.0;

        let mut tx = Transaction::new(&id, &user, amount, merchant, location, payment_method, Utc::now());
        let hour = Utc::now().hour() as u8;
        if !(8..=20).contains(&hour) {
            tx = tx.with_hour(self.rng.gen_range(9..20));
        }
        tx.category = Some(self.random_choice(&["grocery", "dining", "retail", "fuel"]).to_string());
        tx.device_id = Some(format!("dev_{:08x}", self.rng.gen::<u32>()));
        tx
    }

    /// Large night-time purchase at an unknown merchant from a risky place
    fn generate_suspicious(&mut self) -> Transaction {
        let id = self.next_id();
        let user = self.random_user();
        let location = self.location(SUSPICIOUS_CITIES);
        let payment_method = self.random_choice(RISKY_PAYMENT_METHODS);
        let amount = (self.rng.gen_range(2000.0..10000.0_f64) * 100.0).round() / 100.0;

        let mut tx = Transaction::new(
            &id,
            &user,
            amount,
            "Unknown Merchant",
            location,
            payment_method,
            Utc::now(),
        )
        .with_hour(self.rng.gen_range(0..6));
        tx.device_id = Some(format!("dev_{:08x}", self.rng.gen::<u32>()));
        tx
    }

    /// Several rapid transactions for one user, oldest first
    fn generate_burst(&mut self, size: usize) -> Vec<Transaction> {
        let user = self.random_user();
        let location = self.location(HOME_CITIES);
        let now = Utc::now();

        (0..size)
            .map(|i| {
                let id = self.next_id();
                let amount = (self.rng.gen_range(20.0..200.0_f64) * 100.0).round() / 100.0;
                let merchant = self.random_choice(OTHER_MERCHANTS);
                let at = now - ChronoDuration::seconds(((size - i) * 30) as i64);
                Transaction::new(&id, &user, amount, merchant, location.clone(), "credit_card", at)
            })
            .collect()
    }

    /// Next batch to send: usually one transaction, occasionally a burst
    fn next_batch(&mut self, fraud_rate: f64) -> (Vec<Transaction>, bool) {
        if self.rng.gen_bool(fraud_rate) {
            if self.rng.gen_bool(0.25) {
                (self.generate_burst(6), true)
            } else {
                (vec![self.generate_suspicious()], true)
            }
        } else {
            (vec![self.generate_legitimate()], false)
        }
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

struct Args {
    dry_run: bool,
    nats_url: String,
    subject: String,
    count: u64,
    fraud_rate: f64,
    delay_ms: u64,
}

impl Args {
    fn parse() -> Self {
        let mut dry_run = false;
        let mut positional = Vec::new();
        for arg in std::env::args().skip(1) {
            if arg == "--dry-run" {
                dry_run = true;
            } else {
                positional.push(arg);
            }
        }

        Self {
            dry_run,
            nats_url: positional
                .first()
                .cloned()
                .unwrap_or_else(|| "nats://localhost:4222".to_string()),
            subject: positional
                .get(1)
                .cloned()
                .unwrap_or_else(|| "transactions".to_string()),
            count: positional.get(2).and_then(|s| s.parse().ok()).unwrap_or(100),
            fraud_rate: positional
                .get(3)
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.1_f64)
                .clamp(0.0, 1.0),
            delay_ms: positional.get(4).and_then(|s| s.parse().ok()).unwrap_or(100),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    LoggingConfig {
        level: "info".to_string(),
        format: "pretty".to_string(),
    }
    .init()?;

    info!("Starting Synthetic Transaction Generator");

    let args = Args::parse();
    info!(
        nats_url = %args.nats_url,
        subject = %args.subject,
        count = args.count,
        fraud_rate = args.fraud_rate,
        delay_ms = args.delay_ms,
        dry_run = args.dry_run,
        "Configuration loaded"
    );

    if args.dry_run {
        return run_dry_mode(&args).await;
    }

    let client = match async_nats::connect(&args.nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(&args).await;
        }
    };

    let mut generator = TransactionGenerator::new();
    let mut legitimate_count = 0u64;
    let mut suspicious_count = 0u64;

    info!("Starting to publish {} transactions...", args.count);

    for i in 0..args.count {
        let (batch, suspicious) = generator.next_batch(args.fraud_rate);
        if suspicious {
            suspicious_count += batch.len() as u64;
        } else {
            legitimate_count += batch.len() as u64;
        }

        for transaction in &batch {
            let payload = serde_json::to_vec(transaction)?;
            client.publish(args.subject.clone(), payload.into()).await?;
        }

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} batches ({} legitimate, {} suspicious)",
                i + 1,
                args.count,
                legitimate_count,
                suspicious_count
            );
        }

        tokio::time::sleep(Duration::from_millis(args.delay_ms)).await;
    }

    client.flush().await?;
    info!(
        "Completed! Published {} legitimate and {} suspicious transactions",
        legitimate_count, suspicious_count
    );

    Ok(())
}

async fn run_dry_mode(args: &Args) -> Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = TransactionGenerator::new();

    for i in 0..args.count {
        let (batch, _) = generator.next_batch(args.fraud_rate);

        if (i + 1) % 10 == 0 || i == 0 {
            for transaction in &batch {
                let json = serde_json::to_string_pretty(transaction)?;
                info!("Sample transaction {}:\n{}", i + 1, json);
            }
        }

        tokio::time::sleep(Duration::from_millis(args.delay_ms)).await;
    }

    Ok(())
}
