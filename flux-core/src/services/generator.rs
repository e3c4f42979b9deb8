//! Synthetic activity dataset generator
//!
//! Produces a labelled CSV of user + activity rows in three behaviour
//! classes (normal, suspicious, compromised). Output is fully determined by
//! the seed and the anchor time.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime, Timelike};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::domain::format::{format_timestamp, TIMESTAMP_FORMAT};
use crate::domain::{generate_account_number, generate_ifsc, ACCOUNT_ID_BASE};

pub const DEFAULT_ROWS: usize = 6500;
pub const DEFAULT_USERS: usize = 800;
pub const DEFAULT_SEED: u64 = 42;

/// Class shares in percent
const NORMAL_PERCENT: usize = 30;
const SUSPICIOUS_PERCENT: usize = 40;
const COMPROMISED_PERCENT: usize = 30;

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas",
    "Sarah", "Charles", "Karen", "Priya", "Arjun", "Ananya", "Rohan", "Meera", "Wei", "Mei",
    "Hiroshi", "Yuki", "Carlos", "Sofia", "Mateo", "Lucia", "Omar", "Fatima", "Ahmed", "Amara",
    "Kwame", "Ingrid", "Lars",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Wilson", "Anderson", "Taylor", "Thomas", "Moore",
    "Jackson", "Martin", "Lee", "Sharma", "Patel", "Gupta", "Iyer", "Chen", "Wang", "Tanaka",
    "Sato", "Silva", "Santos", "Khan", "Hassan", "Okafor", "Mensah", "Larsen", "Nielsen",
];

const EMAIL_DOMAINS: &[&str] = &["example.com", "example.net", "example.org", "mail.test"];

const DESCRIPTION_WORDS: &[&str] = &[
    "payment", "monthly", "online", "transfer", "grocery", "utility", "invoice", "store",
    "refund", "service", "rent", "subscription", "card", "wallet", "travel", "booking",
    "salary", "insurance", "medical", "fuel", "dining", "order", "settlement", "charge",
];

/// Behaviour class of a generated row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskClass {
    Normal,
    Suspicious,
    Compromised,
}

impl RiskClass {
    /// 1 for attack traffic, 0 for normal
    pub fn label(&self) -> u8 {
        match self {
            RiskClass::Normal => 0,
            RiskClass::Suspicious | RiskClass::Compromised => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    pub rows: usize,
    pub users: usize,
    pub seed: u64,
    /// "Now" for the purpose of picking timestamps
    pub anchor: NaiveDateTime,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            users: DEFAULT_USERS,
            seed: DEFAULT_SEED,
            anchor: chrono::Local::now().naive_local(),
        }
    }
}

/// One synthetic customer shared by many activity rows
#[derive(Debug, Clone)]
struct SyntheticUser {
    account_id: String,
    username: String,
    password: String,
    full_name: String,
    email: String,
    phone: String,
    account_balance: f64,
    kyc_status: &'static str,
    created_at: String,
    account_number: String,
    ifsc: String,
}

/// A dataset row, columns in output order
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GeneratedRow {
    #[serde(rename = "LogID")]
    pub log_id: String,
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub account_balance: f64,
    #[serde(rename = "KYCStatus")]
    pub kyc_status: String,
    pub created_at: String,
    pub account_number: String,
    #[serde(rename = "IFSC")]
    pub ifsc: String,
    #[serde(rename = "AccountID")]
    pub account_id: String,
    pub timestamp: String,
    pub transaction_type: String,
    pub description: String,
    #[serde(rename = "SessionID")]
    pub session_id: String,
    pub transaction_amount: f64,
    pub session_duration: u32,
    pub login_hour: u32,
    pub failed_login_count: u32,
    pub new_device_login: u8,
    pub password_changed: u8,
    pub channel: String,
    pub pages_visited: u32,
    pub click_rate: u32,
    pub rapid_transactions: u8,
    pub beneficiary_added: u8,
    pub large_transaction: u8,
    pub device_trust_score: f64,
    pub cyber_risk_score: u8,
    pub risk_label: u8,
    pub beneficiary_name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationSummary {
    pub rows: usize,
    pub users: usize,
    pub normal: usize,
    pub suspicious: usize,
    pub compromised: usize,
}

impl GenerationSummary {
    /// Rows labelled as attacks
    pub fn attacks(&self) -> usize {
        self.suspicious + self.compromised
    }
}

/// Data generator for labelled activity datasets
pub struct DataGenerator {
    options: GeneratorOptions,
}

impl DataGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    /// Rows per class; rounding leftovers go to the normal class
    pub fn class_counts(&self) -> (usize, usize, usize) {
        let total = self.options.rows;
        let suspicious = total * SUSPICIOUS_PERCENT / 100;
        let compromised = total * COMPROMISED_PERCENT / 100;
        let normal = total * NORMAL_PERCENT / 100;
        let normal = normal + total - (normal + suspicious + compromised);
        (normal, suspicious, compromised)
    }

    /// Build the full shuffled dataset in memory
    pub fn generate(&self) -> Result<Vec<GeneratedRow>> {
        if self.options.users == 0 && self.options.rows > 0 {
            anyhow::bail!("At least one user is required to generate activity");
        }

        let mut rng = StdRng::seed_from_u64(self.options.seed);
        let users: Vec<SyntheticUser> = (0..self.options.users)
            .map(|i| self.synthetic_user(&mut rng, i))
            .collect();

        let (normal, suspicious, compromised) = self.class_counts();
        let classes = std::iter::repeat(RiskClass::Normal)
            .take(normal)
            .chain(std::iter::repeat(RiskClass::Suspicious).take(suspicious))
            .chain(std::iter::repeat(RiskClass::Compromised).take(compromised));

        let mut rows = Vec::with_capacity(self.options.rows);
        for class in classes {
            let user = &users[rng.gen_range(0..users.len())];
            rows.push(self.activity_row(&mut rng, user, class));
        }
        rows.shuffle(&mut rng);
        Ok(rows)
    }

    /// Write the dataset as CSV with a header row
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<GenerationSummary> {
        let rows = self.generate()?;
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in &rows {
            csv_writer.serialize(row).context("Failed to write CSV row")?;
        }
        csv_writer.flush()?;

        let (normal, suspicious, compromised) = self.class_counts();
        Ok(GenerationSummary {
            rows: rows.len(),
            users: self.options.users,
            normal,
            suspicious,
            compromised,
        })
    }

    pub fn write_to_path(&self, path: &Path) -> Result<GenerationSummary> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let summary = self.write_csv(std::io::BufWriter::new(file))?;
        log::info!("Wrote {} rows to {}", summary.rows, path.display());
        Ok(summary)
    }

    fn synthetic_user(&self, rng: &mut StdRng, index: usize) -> SyntheticUser {
        let first = *FIRST_NAMES.choose(rng).unwrap_or(&"Alex");
        let last = *LAST_NAMES.choose(rng).unwrap_or(&"Doe");
        let username = format!(
            "{}{}{}",
            first.to_lowercase(),
            last.to_lowercase().chars().next().unwrap_or('x'),
            rng.gen_range(10..1000)
        );
        let password: String = (0..12)
            .map(|_| rng.sample(rand::distributions::Alphanumeric) as char)
            .collect();
        let created_at = random_time_between(
            rng,
            self.options.anchor - Duration::days(3 * 365),
            self.options.anchor - Duration::days(30),
        );

        SyntheticUser {
            account_id: format!("AC{}", ACCOUNT_ID_BASE + index as u64),
            email: format!(
                "{}@{}",
                username,
                EMAIL_DOMAINS.choose(rng).unwrap_or(&"example.com")
            ),
            username,
            password,
            full_name: format!("{} {}", first, last),
            phone: format!(
                "+1-{:03}-{:03}-{:04}",
                rng.gen_range(200..1000),
                rng.gen_range(200..1000),
                rng.gen_range(0..10000)
            ),
            account_balance: round2(rng.gen_range(10.0..95_000.0)),
            kyc_status: *["Verified", "Verified", "Verified", "Pending", "Rejected"]
                .choose(rng)
                .unwrap_or(&"Verified"),
            created_at: format_timestamp(&created_at),
            account_number: generate_account_number(rng),
            ifsc: generate_ifsc(rng),
        }
    }

    fn activity_row(&self, rng: &mut StdRng, user: &SyntheticUser, class: RiskClass) -> GeneratedRow {
        let timestamp = random_time_between(
            rng,
            self.options.anchor - Duration::days(365),
            self.options.anchor,
        );

        let mut row = GeneratedRow {
            log_id: format!("LOG-{}", short_id(rng)),
            username: user.username.clone(),
            password: user.password.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            account_balance: user.account_balance,
            kyc_status: user.kyc_status.to_string(),
            created_at: user.created_at.clone(),
            account_number: user.account_number.clone(),
            ifsc: user.ifsc.clone(),
            account_id: user.account_id.clone(),
            timestamp: timestamp.format(TIMESTAMP_FORMAT).to_string(),
            transaction_type: pick(rng, &["Credit", "Debit", "Transfer", "Login"]).to_string(),
            description: description(rng),
            session_id: format!("SES-{}", short_id(rng)),
            transaction_amount: round2(rng.gen_range(10.0..2000.0)),
            session_duration: rng.gen_range(45..=900),
            login_hour: timestamp.hour(),
            failed_login_count: pick(rng, &[0, 0, 0, 0, 1]),
            new_device_login: 0,
            password_changed: 0,
            channel: pick(rng, &["Mobile", "Web", "Mobile"]).to_string(),
            pages_visited: rng.gen_range(4..=15),
            click_rate: rng.gen_range(3..=15),
            rapid_transactions: 0,
            beneficiary_added: pick(rng, &[0, 0, 0, 1]),
            large_transaction: 0,
            device_trust_score: round2(rng.gen_range(0.8..=1.0)),
            cyber_risk_score: rng.gen_range(0..=25),
            risk_label: class.label(),
            beneficiary_name: String::new(),
        };

        match class {
            RiskClass::Normal => {}
            RiskClass::Suspicious => {
                row.failed_login_count = rng.gen_range(2..=5);
                row.new_device_login = pick(rng, &[0, 1]);
                row.transaction_amount = round2(rng.gen_range(2000.0..10_000.0));
                row.large_transaction = u8::from(row.transaction_amount > 5000.0);
                row.device_trust_score = round2(rng.gen_range(0.4..=0.7));
                row.cyber_risk_score = rng.gen_range(35..=65);
                row.beneficiary_added = pick(rng, &[0, 1, 1]);
                row.login_hour = pick(rng, &[0, 1, 2, 22, 23]);
                row.rapid_transactions = pick(rng, &[0, 1]);
                row.session_duration = rng.gen_range(15..=60);
            }
            RiskClass::Compromised => {
                row.failed_login_count = rng.gen_range(5..=15);
                row.new_device_login = 1;
                row.password_changed = pick(rng, &[0, 1]);
                row.transaction_amount = round2(rng.gen_range(10_000.0..95_000.0));
                row.large_transaction = 1;
                row.device_trust_score = round2(rng.gen_range(0.0..=0.3));
                row.cyber_risk_score = rng.gen_range(75..=100);
                row.beneficiary_added = 1;
                row.rapid_transactions = 1;
                row.login_hour = pick(rng, &[0, 1, 2, 3]);
                row.session_duration = rng.gen_range(5..=20);
                row.channel = "Web".to_string();
                row.transaction_type = "Transfer".to_string();
            }
        }

        row.beneficiary_name = if row.beneficiary_added == 1 {
            format!(
                "{} {}",
                pick(rng, FIRST_NAMES),
                pick(rng, LAST_NAMES)
            )
        } else {
            "None".to_string()
        };
        row
    }
}

fn pick<T: Copy>(rng: &mut StdRng, items: &[T]) -> T {
    items[rng.gen_range(0..items.len())]
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// First eight hex digits of a seeded v4 UUID
fn short_id(rng: &mut StdRng) -> String {
    let uuid = uuid::Builder::from_random_bytes(rng.gen()).into_uuid();
    uuid.simple().to_string()[..8].to_string()
}

/// Three or four capitalized words, no trailing period
fn description(rng: &mut StdRng) -> String {
    let count = rng.gen_range(3..=4);
    let words: Vec<&str> = (0..count).map(|_| pick(rng, DESCRIPTION_WORDS)).collect();
    let sentence = words.join(" ");
    let mut chars = sentence.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => sentence,
    }
}

fn random_time_between(rng: &mut StdRng, start: NaiveDateTime, end: NaiveDateTime) -> NaiveDateTime {
    let span = (end - start).num_seconds().max(1);
    start + Duration::seconds(rng.gen_range(0..span))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::format::parse_timestamp;

    fn options(rows: usize, users: usize) -> GeneratorOptions {
        GeneratorOptions {
            rows,
            users,
            seed: 7,
            anchor: parse_timestamp("2025-06-01 12:00:00").unwrap(),
        }
    }

    #[test]
    fn test_class_split() {
        let generator = DataGenerator::new(GeneratorOptions {
            rows: DEFAULT_ROWS,
            ..options(0, 1)
        });
        assert_eq!(generator.class_counts(), (1950, 2600, 1950));

        let odd = DataGenerator::new(options(11, 1));
        let (n, s, c) = odd.class_counts();
        assert_eq!(n + s + c, 11);
        assert_eq!((s, c), (4, 3));
    }

    #[test]
    fn test_same_seed_same_rows() {
        let a = DataGenerator::new(options(50, 10)).generate().unwrap();
        let b = DataGenerator::new(options(50, 10)).generate().unwrap();
        let ids_a: Vec<_> = a.iter().map(|r| r.log_id.clone()).collect();
        let ids_b: Vec<_> = b.iter().map(|r| r.log_id.clone()).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn test_class_value_ranges() {
        let rows = DataGenerator::new(options(300, 20)).generate().unwrap();
        for row in &rows {
            if row.cyber_risk_score >= 75 {
                assert_eq!(row.risk_label, 1);
            }
            if row.risk_label == 0 {
                assert!(row.cyber_risk_score <= 25);
                assert!(row.transaction_amount <= 2000.0);
            }
            assert!(row.account_id.starts_with("AC10"));
            assert!(row.ifsc.starts_with("FLUX0"));
            assert_eq!(row.beneficiary_name == "None", row.beneficiary_added == 0);
        }
        let attacks = rows.iter().filter(|r| r.risk_label == 1).count();
        assert_eq!(attacks, 120 + 90);
    }

    #[test]
    fn test_csv_header_and_row_count() {
        let mut buffer = Vec::new();
        let summary = DataGenerator::new(options(20, 5)).write_csv(&mut buffer).unwrap();
        assert_eq!(summary.rows, 20);
        assert_eq!(summary.attacks(), 14);

        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("LogID,Username,Password,FullName"));
        assert!(header.ends_with("CyberRiskScore,RiskLabel,BeneficiaryName"));
        assert_eq!(lines.count(), 20);
    }

    #[test]
    fn test_no_users_is_an_error() {
        assert!(DataGenerator::new(options(5, 0)).generate().is_err());
    }
}
