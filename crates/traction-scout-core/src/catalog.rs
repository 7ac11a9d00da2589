//! Versioned lookup tables used by the classifiers and resolvers.
//!
//! Every keyword list, pattern list, and curated organization table lives
//! in a [`Catalog`] value that callers pass into the pure classifier
//! functions. [`Catalog::builtin`] carries the reference tables; a TOML
//! override can replace any section (see [`Catalog::from_toml_str`]).
//!
//! ```toml
//! version = "2026-10-team"
//! big_tech_orgs = ["bigcorp"]
//!
//! [[known_funded]]
//! owner = "acme"
//! stage = "seed"
//! amount = "$3M"
//! source = "Known"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::{Category, FundingStage};

/// Keyword list for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryKeywords {
    pub category: Category,
    pub keywords: Vec<String>,
}

/// Substring markers for repositories that are not products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NonInvestablePatterns {
    pub name_patterns: Vec<String>,
    pub description_patterns: Vec<String>,
}

/// A curated funding fact for one organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownFunding {
    pub owner: String,
    pub stage: FundingStage,
    pub amount: Option<String>,
    pub source: Option<String>,
}

/// A phrase that marks accelerator backing in free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceleratorPhrase {
    pub phrase: String,
    pub label: String,
    pub source: String,
}

/// Keyword lists for the commercial-intent checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommercialKeywords {
    pub pricing: Vec<String>,
    pub enterprise: Vec<String>,
    /// Distinct enterprise keywords required before the signal fires.
    pub enterprise_min_matches: usize,
    pub cloud: Vec<String>,
    pub company: Vec<String>,
    /// Domain of the source-hosting platform; homepages on it do not count.
    pub source_host: String,
}

/// All lookup data consumed by the classification layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub version: String,
    pub category_keywords: Vec<CategoryKeywords>,
    pub non_investable: NonInvestablePatterns,
    pub big_tech_orgs: Vec<String>,
    pub known_funded: Vec<KnownFunding>,
    pub accelerators: Vec<AcceleratorPhrase>,
    pub commercial: CommercialKeywords,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn funded(owner: &str, stage: FundingStage, amount: &str, source: &str) -> KnownFunding {
    KnownFunding {
        owner: owner.to_string(),
        stage,
        amount: Some(amount.to_string()),
        source: Some(source.to_string()),
    }
}

impl Catalog {
    pub const BUILTIN_VERSION: &'static str = "builtin-1";

    /// The reference tables.
    pub fn builtin() -> Self {
        Self {
            version: Self::BUILTIN_VERSION.to_string(),
            category_keywords: builtin_category_keywords(),
            non_investable: NonInvestablePatterns {
                name_patterns: words(&[
                    "awesome-", "awesome_", "-awesome", "_awesome",
                    "cheatsheet", "cheat-sheet", "cheat_sheet",
                    "interview", "leetcode", "algorithm", "data-structure",
                    "tutorial", "learn-", "learning-", "-tutorial",
                    "example", "sample", "demo", "boilerplate", "starter",
                    "course", "roadmap", "guide", "handbook", "book",
                    "dotfiles", "config", "setup",
                ]),
                description_patterns: words(&[
                    "curated list", "awesome list", "collection of",
                    "interview prep", "coding interview", "system design interview",
                    "cheat sheet", "cheatsheet", "quick reference",
                    "learning resource", "study guide", "course material",
                    "my personal", "my dotfiles", "my config",
                ]),
            },
            big_tech_orgs: words(&[
                "microsoft", "google", "facebook", "meta", "amazon", "apple", "netflix",
                "alphabet", "aws", "azure", "googlecloud",
                "googlechrome", "chromedevtools", "chromium", "googleapis", "googlefonts",
                "googlecloudplatform", "google-research", "tensorflow", "angular",
                "microsoftdocs", "dotnet", "azure-samples", "vscode", "typescript",
                "oracle", "ibm", "salesforce", "adobe", "vmware", "cisco", "intel",
                "nvidia", "amd", "qualcomm", "samsung", "huawei", "alibaba", "tencent",
                "baidu", "bytedance", "jd", "meituan",
                "samsungsailmontreal", "samsungresearch",
                "uber", "lyft", "airbnb", "stripe", "paypal", "square", "block",
                "twitter", "x", "snap", "snapchat", "pinterest", "linkedin",
                "spotify", "dropbox", "slack", "zoom", "twilio", "datadog",
                "snowflake", "databricks", "confluent", "mongodb", "elastic",
                "digitalocean", "cloudflare", "fastly", "vercel", "netlify",
                "github", "gitlab", "atlassian", "jetbrains", "hashicorp",
                "openai", "anthropic", "anthropics", "deepmind", "cohere",
                "deepseek-ai", "qwenlm", "mistralai",
                "tongyi-mai", "alibabaresearch",
                "redhat", "canonical", "suse", "cloudera", "palantir", "splunk",
            ]),
            known_funded: vec![
                funded("langchain-ai", FundingStage::SeriesA, "$25M", "Sequoia"),
                funded("huggingface", FundingStage::SeriesD, "$235M", "Known"),
                funded("vercel", FundingStage::SeriesD, "$250M", "Known"),
                funded("supabase", FundingStage::SeriesC, "$116M", "Known"),
                funded("prisma", FundingStage::SeriesB, "$40M", "Known"),
                funded("planetscale", FundingStage::SeriesC, "$50M", "Known"),
                funded("neon", FundingStage::SeriesB, "$104M", "Known"),
                funded("airbyte", FundingStage::SeriesB, "$150M", "Known"),
                funded("temporal", FundingStage::SeriesB, "$103M", "Known"),
                funded("dagster", FundingStage::SeriesB, "$33M", "Known"),
                funded("prefect", FundingStage::SeriesB, "$32M", "Known"),
                funded("posthog", FundingStage::SeriesB, "$15M", "Known"),
                funded("cal.com", FundingStage::SeriesA, "$25M", "Known"),
                funded("dagger", FundingStage::SeriesA, "$20M", "Known"),
                funded("infisical", FundingStage::Seed, "$2.8M", "Known"),
                funded("trigger.dev", FundingStage::Seed, "$3M", "Known"),
                funded("composio", FundingStage::Seed, "$2M", "Known"),
            ],
            accelerators: vec![
                AcceleratorPhrase {
                    phrase: "y combinator".to_string(),
                    label: "YC-backed".to_string(),
                    source: "YC".to_string(),
                },
                AcceleratorPhrase {
                    phrase: "(yc".to_string(),
                    label: "YC-backed".to_string(),
                    source: "YC".to_string(),
                },
            ],
            commercial: CommercialKeywords {
                pricing: words(&[
                    "pricing", "plans", "enterprise", "pro version", "premium",
                    "subscription", "license", "commercial", "paid", "free tier",
                    "contact sales", "book a demo", "request demo", "talk to sales",
                ]),
                enterprise: words(&[
                    "enterprise", "sso", "saml", "ldap", "audit log",
                    "role-based", "rbac", "compliance", "soc 2", "hipaa",
                    "gdpr", "on-premise", "self-hosted", "air-gapped",
                ]),
                enterprise_min_matches: 2,
                cloud: words(&[
                    "cloud", "hosted", "saas", "managed", "our platform",
                    "sign up", "get started", "try for free", "start free",
                ]),
                company: words(&[
                    "our team", "about us", "careers", "we are", "our company",
                    "founded", "investors", "backed by", "raised", "funding",
                ]),
                source_host: "github.com".to_string(),
            },
        }
    }

    /// Parses a TOML override. Sections that are absent keep the built-in
    /// values.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let catalog: Catalog =
            toml::from_str(content).with_context(|| "Failed to parse catalog")?;
        Ok(catalog)
    }

    /// Reads a TOML override from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Keyword list for a category, empty when the catalog has none.
    pub fn keywords_for(&self, category: Category) -> &[String] {
        self.category_keywords
            .iter()
            .find(|ck| ck.category == category)
            .map(|ck| ck.keywords.as_slice())
            .unwrap_or(&[])
    }
}

impl Default for NonInvestablePatterns {
    fn default() -> Self {
        Catalog::builtin().non_investable
    }
}

impl Default for CommercialKeywords {
    fn default() -> Self {
        Catalog::builtin().commercial
    }
}

fn builtin_category_keywords() -> Vec<CategoryKeywords> {
    let table: [(Category, &[&str]); 9] = [
        (
            Category::AiMl,
            &[
                "llm", "gpt", "transformer", "neural", "deep learning", "machine learning",
                "ml", "ai", "artificial intelligence", "nlp", "computer vision", "cv",
                "embedding", "vector", "rag", "agent", "chatbot", "generative",
                "diffusion", "stable diffusion", "language model", "fine-tun",
                "inference", "training", "model", "pytorch", "tensorflow", "hugging",
            ],
        ),
        (
            Category::Devtools,
            &[
                "developer", "ide", "editor", "debugger", "profiler", "linter",
                "formatter", "cli", "command line", "terminal", "shell", "sdk",
                "api", "framework", "library", "toolkit", "devtool", "dx",
                "code generation", "copilot", "autocomplete", "snippet",
            ],
        ),
        (
            Category::Infrastructure,
            &[
                "kubernetes", "k8s", "docker", "container", "orchestration",
                "infrastructure", "infra", "cloud", "serverless", "lambda",
                "terraform", "pulumi", "ansible", "helm", "gitops", "ci/cd",
                "pipeline", "deployment", "scaling", "load balancer", "proxy",
                "service mesh", "istio", "envoy", "ingress",
            ],
        ),
        (
            Category::Data,
            &[
                "database", "sql", "nosql", "postgres", "mysql", "redis",
                "elasticsearch", "kafka", "streaming", "etl", "pipeline",
                "data warehouse", "analytics", "olap", "oltp", "timeseries",
                "graph database", "vector database", "data lake", "spark",
                "flink", "airflow", "dagster", "dbt", "data engineering",
            ],
        ),
        (
            Category::Security,
            &[
                "security", "auth", "authentication", "authorization", "oauth",
                "sso", "identity", "iam", "rbac", "encryption", "cryptography",
                "vulnerability", "scanner", "pentest", "penetration", "siem",
                "firewall", "waf", "devsecops", "secrets", "vault", "compliance",
            ],
        ),
        (
            Category::Observability,
            &[
                "monitoring", "observability", "logging", "tracing", "metrics",
                "apm", "alerting", "dashboard", "grafana", "prometheus",
                "opentelemetry", "jaeger", "zipkin", "elk", "log aggregation",
            ],
        ),
        (
            Category::Frontend,
            &[
                "react", "vue", "angular", "svelte", "frontend", "ui", "ux",
                "component", "design system", "css", "tailwind", "styled",
                "animation", "web", "browser", "dom", "javascript", "typescript",
            ],
        ),
        (
            Category::Backend,
            &[
                "backend", "server", "rest", "graphql", "grpc", "websocket",
                "microservice", "monolith", "api gateway", "rate limit",
                "caching", "queue", "message broker", "event driven",
            ],
        ),
        (
            Category::Fintech,
            &[
                "payment", "fintech", "banking", "trading", "crypto", "blockchain",
                "defi", "wallet", "transaction", "ledger", "invoice", "billing",
            ],
        ),
    ];

    table
        .iter()
        .map(|(category, keywords)| CategoryKeywords {
            category: *category,
            keywords: words(keywords),
        })
        .collect()
}
