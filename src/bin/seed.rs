// src/bin/seed.rs
// DOCUMENTATION: Catalog seeder
// PURPOSE: Load countries, cities and categories from a JSON file through the admin API
//
// Usage: cargo run --bin seed -- [path/to/seed.json]

use anyhow::{anyhow, bail, Context, Result};
use dotenv::dotenv;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::env;
use std::process;
use std::time::{Duration, Instant};
use uuid::Uuid;

// --- ANSI colours ---
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

const DEFAULT_SEED_FILE: &str = "demos/seed.json";

// --- Seed file ---

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    countries: Vec<SeedCountry>,
    #[serde(default)]
    cities: Vec<SeedCity>,
    #[serde(default)]
    categories: Vec<SeedCategory>,
}

#[derive(Debug, Deserialize, Serialize)]
struct SeedCountry {
    name: String,
    code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    translations: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SeedCity {
    name: String,
    country_code: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    translations: Option<Value>,
}

#[derive(Debug, Serialize)]
struct CityPayload<'a> {
    country_id: Uuid,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    translations: Option<&'a Value>,
}

#[derive(Debug, Deserialize, Serialize)]
struct SeedCategory {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    translations: Option<Value>,
    #[serde(default)]
    display_order: i32,
}

#[derive(Debug, Deserialize)]
struct CountryRecord {
    id: Uuid,
    code: String,
}

#[derive(Debug, PartialEq)]
enum Outcome {
    Created,
    Existing,
    Failed(String),
}

#[derive(Debug)]
struct SeedResult {
    kind: &'static str,
    name: String,
    outcome: Outcome,
}

// --- Seeder ---

struct CatalogSeeder {
    base_url: String,
    admin_token: String,
    client: Client,
    results: Vec<SeedResult>,
}

impl CatalogSeeder {
    fn new(base_url: String, admin_token: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            admin_token,
            client,
            results: Vec::new(),
        })
    }

    async fn check_service_health(&self) -> bool {
        match self.client.get(format!("{}/health", self.base_url)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// POST an admin payload. A 409 means the record is already there.
    async fn post<T: Serialize + ?Sized>(&self, path: &str, payload: &T) -> Result<Option<Value>> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("X-Admin-Token", &self.admin_token)
            .json(payload)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(Some(response.json::<Value>().await?)),
            StatusCode::CONFLICT => Ok(None),
            status => {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                bail!("HTTP {} - {}", status, body)
            }
        }
    }

    async fn existing_countries(&self) -> Result<HashMap<String, Uuid>> {
        let response = self
            .client
            .get(format!("{}/admin/countries", self.base_url))
            .header("X-Admin-Token", &self.admin_token)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("HTTP {} listing countries", response.status());
        }

        let countries: Vec<CountryRecord> = response.json().await?;
        Ok(countries
            .into_iter()
            .map(|c| (c.code.to_uppercase(), c.id))
            .collect())
    }

    fn record(&mut self, kind: &'static str, name: &str, outcome: Outcome) {
        match &outcome {
            Outcome::Created => println!("{}✅ {} {}{}", GREEN, kind, name, RESET),
            Outcome::Existing => println!("{}•  {} {} already exists{}", YELLOW, kind, name, RESET),
            Outcome::Failed(err) => println!("{}❌ {} {}: {}{}", RED, kind, name, err, RESET),
        }
        self.results.push(SeedResult {
            kind,
            name: name.to_string(),
            outcome,
        });
    }

    async fn seed_countries(&mut self, countries: &[SeedCountry]) -> HashMap<String, Uuid> {
        let mut ids = HashMap::new();

        for country in countries {
            let code = country.code.trim().to_uppercase();
            match self.post("/admin/countries", country).await {
                Ok(Some(created)) => {
                    match created.get("id").and_then(Value::as_str).map(Uuid::parse_str) {
                        Some(Ok(id)) => {
                            ids.insert(code, id);
                        }
                        _ => {
                            self.record(
                                "country",
                                &country.name,
                                Outcome::Failed("response has no id".to_string()),
                            );
                            continue;
                        }
                    }
                    self.record("country", &country.name, Outcome::Created);
                }
                Ok(None) => self.record("country", &country.name, Outcome::Existing),
                Err(e) => self.record("country", &country.name, Outcome::Failed(e.to_string())),
            }
        }

        // Countries that already existed still need their ids for the cities
        match self.existing_countries().await {
            Ok(existing) => {
                for (code, id) in existing {
                    ids.entry(code).or_insert(id);
                }
            }
            Err(e) => println!("{}⚠️  Could not list countries: {}{}", YELLOW, e, RESET),
        }

        ids
    }

    async fn seed_cities(&mut self, cities: &[SeedCity], country_ids: &HashMap<String, Uuid>) {
        for city in cities {
            let Some(country_id) = country_ids.get(&city.country_code.trim().to_uppercase()) else {
                self.record(
                    "city",
                    &city.name,
                    Outcome::Failed(format!("unknown country code '{}'", city.country_code)),
                );
                continue;
            };

            let payload = CityPayload {
                country_id: *country_id,
                name: &city.name,
                latitude: city.latitude,
                longitude: city.longitude,
                translations: city.translations.as_ref(),
            };

            let outcome = match self.post("/admin/cities", &payload).await {
                Ok(Some(_)) => Outcome::Created,
                Ok(None) => Outcome::Existing,
                Err(e) => Outcome::Failed(e.to_string()),
            };
            self.record("city", &city.name, outcome);

            // Geocoding providers ask for at most one request per second
            if city.latitude.is_none() || city.longitude.is_none() {
                tokio::time::sleep(Duration::from_millis(1100)).await;
            }
        }
    }

    async fn seed_categories(&mut self, categories: &[SeedCategory]) {
        for category in categories {
            let outcome = match self.post("/admin/categories", category).await {
                Ok(Some(_)) => Outcome::Created,
                Ok(None) => Outcome::Existing,
                Err(e) => Outcome::Failed(e.to_string()),
            };
            self.record("category", &category.name, outcome);
        }
    }

    async fn run(&mut self, seed: &SeedFile) -> Result<()> {
        println!("\n{}🔍 Checking service status...{}", CYAN, RESET);
        if !self.check_service_health().await {
            return Err(anyhow!(
                "service unavailable at {} (is pages-directory running?)",
                self.base_url
            ));
        }
        println!("{}✅ Service available{}\n", GREEN, RESET);

        println!(
            "{}📊 {} countries, {} cities, {} categories{}\n",
            BOLD,
            seed.countries.len(),
            seed.cities.len(),
            seed.categories.len(),
            RESET
        );

        let started = Instant::now();
        let country_ids = self.seed_countries(&seed.countries).await;
        self.seed_cities(&seed.cities, &country_ids).await;
        self.seed_categories(&seed.categories).await;

        self.print_summary(started.elapsed());
        Ok(())
    }

    fn failures(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Failed(_)))
            .count()
    }

    fn print_summary(&self, elapsed: Duration) {
        println!("\n{}📋 Seed Summary{}", BOLD, RESET);
        println!("──────────────────────────────────────────────────────");
        println!("{:<12} {:>10} {:>10} {:>10}", "Kind", "Created", "Existing", "Failed");
        println!("──────────────────────────────────────────────────────");

        for kind in ["country", "city", "category"] {
            let (mut created, mut existing, mut failed) = (0, 0, 0);
            for res in self.results.iter().filter(|r| r.kind == kind) {
                match res.outcome {
                    Outcome::Created => created += 1,
                    Outcome::Existing => existing += 1,
                    Outcome::Failed(_) => failed += 1,
                }
            }
            println!("{:<12} {:>10} {:>10} {:>10}", kind, created, existing, failed);
        }

        println!("──────────────────────────────────────────────────────");
        for res in &self.results {
            if let Outcome::Failed(err) = &res.outcome {
                println!("{}  • {} {}: {}{}", RED, res.kind, res.name, err, RESET);
            }
        }
        println!("Total Duration: {:.1}s", elapsed.as_secs_f64());
    }
}

fn load_seed_file(path: &str) -> Result<SeedFile> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path))
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let path = env::args().nth(1).unwrap_or_else(|| DEFAULT_SEED_FILE.to_string());
    let base_url =
        env::var("DIRECTORY_API_URL").unwrap_or_else(|_| "http://localhost:8003".to_string());
    let admin_token = match env::var("ADMIN_TOKEN") {
        Ok(token) => token,
        Err(_) => {
            println!("{}❌ ADMIN_TOKEN must be set in .env{}", RED, RESET);
            process::exit(1);
        }
    };

    let seed = match load_seed_file(&path) {
        Ok(seed) => seed,
        Err(e) => {
            println!("{}❌ {:#}{}", RED, e, RESET);
            process::exit(1);
        }
    };

    let mut seeder = match CatalogSeeder::new(base_url, admin_token) {
        Ok(seeder) => seeder,
        Err(e) => {
            println!("{}❌ {:#}{}", RED, e, RESET);
            process::exit(1);
        }
    };

    if let Err(e) = seeder.run(&seed).await {
        println!("{}❌ {:#}{}", RED, e, RESET);
        process::exit(1);
    }

    let failures = seeder.failures();
    if failures > 0 {
        println!("\n{}⚠️  {} item(s) failed{}", YELLOW, failures, RESET);
        process::exit(1);
    }
    println!("\n{}✨ Seed completed{}", GREEN, RESET);
}
