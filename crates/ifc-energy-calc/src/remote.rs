// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Remote consumption estimator backed by an OpenAI-compatible chat
//! completion service
//!
//! The service is asked for a JSON estimate. Anything short of a complete,
//! plausible answer (transport failure, timeout, missing keys, negative or
//! non-finite numbers, paybacks outside (0, 10] years) falls back to the
//! benchmark estimate, so callers cannot tell a failed call from a local
//! estimate.

use crate::error::EnergyError;
use crate::estimator::{self, ConsumptionEstimator};
use crate::records::{BuildingDataRecord, ConsumptionRecord, RecommendationRecord};
use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const ENV_LLM_MODEL: &str = "IFC_ENERGY_LLM_MODEL";
pub const ENV_LLM_BASE_URL: &str = "IFC_ENERGY_LLM_BASE_URL";
pub const ENV_LLM_API_KEY: &str = "IFC_ENERGY_LLM_API_KEY";
pub const ENV_LLM_TIMEOUT_MS: &str = "IFC_ENERGY_LLM_TIMEOUT_MS";

pub const DEFAULT_LLM_MODEL: &str = "gpt-4";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

pub const SYSTEM_PROMPT: &str = "You are a building energy expert. Return only valid JSON.";

/// Longest payback the service may propose
pub const MAX_PAYBACK_YEARS: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEstimatorConfig {
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
    pub temperature: f32,
}

impl RemoteEstimatorConfig {
    /// Configuration with defaults for everything but the key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            model: DEFAULT_LLM_MODEL.to_string(),
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout_ms: DEFAULT_LLM_TIMEOUT_MS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Read a TOML file keyed like the environment; missing keys fall back
    /// to the environment
    pub fn from_config_file(path: &Path) -> Result<Self, RemoteConfigError> {
        let content = fs::read_to_string(path).map_err(|err| RemoteConfigError::ReadConfigFile {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        let value: toml::Value =
            toml::from_str(&content).map_err(|err| RemoteConfigError::ParseConfigFile {
                path: path.display().to_string(),
                message: err.to_string(),
            })?;
        let table = value
            .as_table()
            .ok_or_else(|| RemoteConfigError::ParseConfigFile {
                path: path.display().to_string(),
                message: "root is not a TOML table".to_string(),
            })?;

        Self::from_env_with(|key| {
            table
                .get(key)
                .and_then(toml_value_to_string)
                .or_else(|| std::env::var(key).ok())
        })
    }

    pub fn from_env() -> Result<Self, RemoteConfigError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; only the API key is required
    pub fn from_env_with<F>(mut getter: F) -> Result<Self, RemoteConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let api_key = required_value(&mut getter, ENV_LLM_API_KEY)?;
        let model = optional_value(&mut getter, ENV_LLM_MODEL)
            .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string());
        let base_url = optional_value(&mut getter, ENV_LLM_BASE_URL)
            .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string());
        let timeout_ms = match optional_value(&mut getter, ENV_LLM_TIMEOUT_MS) {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => ms,
                _ => return Err(RemoteConfigError::InvalidTimeout { value }),
            },
            None => DEFAULT_LLM_TIMEOUT_MS,
        };

        Ok(Self {
            model,
            base_url,
            api_key,
            timeout_ms,
            temperature: DEFAULT_TEMPERATURE,
        })
    }
}

fn toml_value_to_string(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(value) => Some(value.clone()),
        toml::Value::Integer(value) => Some(value.to_string()),
        toml::Value::Float(value) => Some(value.to_string()),
        toml::Value::Boolean(value) => Some(value.to_string()),
        _ => None,
    }
}

fn required_value<F>(getter: &mut F, key: &'static str) -> Result<String, RemoteConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    let value = getter(key).ok_or(RemoteConfigError::MissingValue { key })?;
    if value.trim().is_empty() {
        return Err(RemoteConfigError::EmptyValue { key });
    }
    Ok(value)
}

fn optional_value<F>(getter: &mut F, key: &str) -> Option<String>
where
    F: FnMut(&str) -> Option<String>,
{
    getter(key).filter(|value| !value.trim().is_empty())
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteConfigError {
    #[error("missing configuration value: {key}")]
    MissingValue { key: &'static str },

    #[error("empty configuration value: {key}")]
    EmptyValue { key: &'static str },

    #[error("invalid timeout value: {value}")]
    InvalidTimeout { value: String },

    #[error("read config file failed ({path}): {message}")]
    ReadConfigFile { path: String, message: String },

    #[error("parse config file failed ({path}): {message}")]
    ParseConfigFile { path: String, message: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("client build failed: {message}")]
    BuildClient { message: String },

    #[error("http request failed: {message}")]
    Http { message: String },

    #[error("http status {code}: {message}")]
    HttpStatus { code: u16, message: String },

    #[error("decode response failed: {message}")]
    DecodeResponse { message: String },

    #[error("empty completion choice")]
    EmptyChoice,

    #[error("no JSON object in completion")]
    MissingJson,

    #[error("invalid estimate: {message}")]
    InvalidEstimate { message: String },
}

impl RemoteError {
    fn invalid(message: impl Into<String>) -> Self {
        RemoteError::InvalidEstimate {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
}

/// A chat completion backend
pub trait CompletionClient: Send + Sync {
    /// Send one request and return the text of the first choice
    fn complete(&self, request: &CompletionRequest) -> Result<String, RemoteError>;
}

#[derive(Debug, Clone)]
pub struct OpenAiChatClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl OpenAiChatClient {
    pub fn from_config(config: &RemoteEstimatorConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms.max(1)))
            .build()
            .map_err(|err| RemoteError::BuildClient {
                message: err.to_string(),
            })?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl CompletionClient for OpenAiChatClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, RemoteError> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = ChatCompletionRequest {
            model: request.model.as_str(),
            messages: [
                ChatMessage {
                    role: "system",
                    content: request.system_prompt.as_str(),
                },
                ChatMessage {
                    role: "user",
                    content: request.user_prompt.as_str(),
                },
            ],
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .map_err(|err| RemoteError::Http {
                message: err.to_string(),
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let message = response.text().unwrap_or_else(|_| "<no body>".to_string());
            return Err(RemoteError::HttpStatus {
                code: status.as_u16(),
                message,
            });
        }

        let response: ChatCompletionResponse =
            response
                .json()
                .map_err(|err| RemoteError::DecodeResponse {
                    message: err.to_string(),
                })?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(RemoteError::EmptyChoice)
    }
}

/// Estimate shape the service is asked to return
#[derive(Debug, Deserialize)]
struct RemoteEstimate {
    lighting_consumption: f64,
    hvac_consumption: f64,
    equipment_consumption: f64,
    total_annual_consumption: f64,
    energy_intensity: f64,
    #[serde(default)]
    peak_demand: Option<f64>,
    recommendations: Vec<RemoteRecommendation>,
}

#[derive(Debug, Deserialize)]
struct RemoteRecommendation {
    title: String,
    description: String,
    potential_savings_kwh: f64,
    implementation_cost_jod: f64,
    payback_years: f64,
}

/// Consumption estimator that asks a remote service first
#[derive(Debug)]
pub struct RemoteEstimator<C: CompletionClient> {
    config: RemoteEstimatorConfig,
    client: C,
}

impl RemoteEstimator<OpenAiChatClient> {
    pub fn from_config(config: RemoteEstimatorConfig) -> Result<Self, RemoteError> {
        let client = OpenAiChatClient::from_config(&config)?;
        Ok(Self::new(config, client))
    }
}

impl<C: CompletionClient> RemoteEstimator<C> {
    pub fn new(config: RemoteEstimatorConfig, client: C) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &RemoteEstimatorConfig {
        &self.config
    }

    /// Ask the service once, without falling back
    pub fn try_estimate(&self, record: &BuildingDataRecord) -> Result<ConsumptionRecord, RemoteError> {
        let request = CompletionRequest {
            model: self.config.model.clone(),
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: user_prompt(record),
            temperature: self.config.temperature,
        };
        let output = self.client.complete(&request)?;
        debug!("Remote estimate received ({} bytes)", output.len());
        parse_estimate(&output, &self.config.model)
    }
}

impl<C: CompletionClient> ConsumptionEstimator for RemoteEstimator<C> {
    fn estimate(&self, record: &BuildingDataRecord) -> ConsumptionRecord {
        match self.try_estimate(record) {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    "{}; using benchmark estimate",
                    EnergyError::EstimationTransport(err)
                );
                estimator::estimate(record)
            }
        }
    }
}

/// Method tag of an accepted remote estimate
pub fn remote_method(model: &str) -> String {
    format!("Remote engineering estimate ({})", model)
}

/// Prompt describing the building and the engineering method to apply
pub fn user_prompt(record: &BuildingDataRecord) -> String {
    let elements = &record.building_elements;
    let building_type = record
        .building_info
        .as_ref()
        .map(|info| info.building_type.as_str())
        .unwrap_or("Unknown");

    format!(
        "Estimate the annual electricity consumption of a building in Amman, Jordan.

Building data:
- Building type: {building_type}
- Total floor area: {area:.1} m²
- Number of spaces: {spaces}
- Walls: {walls}
- Windows: {windows}
- Window-to-wall ratio: {wwr:.2}

Method:
1. Lighting: lighting power density 8-12 W/m², 2000 operating hours per year.
2. Equipment: plug load density 8-15 W/m², 2000 operating hours per year.
3. HVAC: Amman climate with 1500 heating degree days and 900 cooling degree days, \
about 80 kWh/m²·year thermal load, system COP 3.0.
4. Recommend 3 to 5 efficiency measures with payback under 10 years, costs in JOD.

Return only a JSON object with these keys:
{{
  \"lighting_consumption\": number,
  \"hvac_consumption\": number,
  \"equipment_consumption\": number,
  \"total_annual_consumption\": number,
  \"energy_intensity\": number,
  \"recommendations\": [
    {{
      \"title\": string,
      \"description\": string,
      \"potential_savings_kwh\": number,
      \"implementation_cost_jod\": number,
      \"payback_years\": number
    }}
  ]
}}",
        area = record.total_floor_area,
        spaces = record.spaces.len(),
        walls = elements.walls_count,
        windows = elements.windows_count,
        wwr = elements.window_to_wall_ratio,
    )
}

/// Parse and validate the service output
pub fn parse_estimate(output: &str, model: &str) -> Result<ConsumptionRecord, RemoteError> {
    let json = extract_json_block(output).ok_or(RemoteError::MissingJson)?;
    let estimate: RemoteEstimate =
        serde_json::from_str(json).map_err(|err| RemoteError::invalid(err.to_string()))?;

    let amounts = [
        ("lighting_consumption", estimate.lighting_consumption),
        ("hvac_consumption", estimate.hvac_consumption),
        ("equipment_consumption", estimate.equipment_consumption),
        ("total_annual_consumption", estimate.total_annual_consumption),
        ("energy_intensity", estimate.energy_intensity),
    ];
    for (key, value) in amounts {
        check_amount(key, value)?;
    }
    if let Some(peak) = estimate.peak_demand {
        check_amount("peak_demand", peak)?;
    }

    let recommendations = estimate
        .recommendations
        .into_iter()
        .map(|rec| {
            check_amount("potential_savings_kwh", rec.potential_savings_kwh)?;
            check_amount("implementation_cost_jod", rec.implementation_cost_jod)?;
            if !(rec.payback_years.is_finite()
                && rec.payback_years > 0.0
                && rec.payback_years <= MAX_PAYBACK_YEARS)
            {
                return Err(RemoteError::invalid(format!(
                    "payback_years {} outside (0, {}]",
                    rec.payback_years, MAX_PAYBACK_YEARS
                )));
            }
            Ok(RecommendationRecord {
                title: rec.title,
                description: rec.description,
                potential_savings_kwh: rec.potential_savings_kwh,
                implementation_cost_jod: rec.implementation_cost_jod,
                payback_years: rec.payback_years,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ConsumptionRecord {
        lighting_consumption: estimate.lighting_consumption,
        hvac_consumption: estimate.hvac_consumption,
        equipment_consumption: estimate.equipment_consumption,
        total_annual_consumption: estimate.total_annual_consumption,
        energy_intensity: estimate.energy_intensity,
        peak_demand: estimate.peak_demand,
        calculation_method: remote_method(model),
        recommendations,
    })
}

fn check_amount(key: &str, value: f64) -> Result<(), RemoteError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(RemoteError::invalid(format!("{} must be a non-negative number, got {}", key, value)))
    }
}

/// Outermost `{ ... }` of a completion that may wrap its JSON in prose or a
/// code fence
fn extract_json_block(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    raw.get(start..=end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::SpaceRecord;
    use std::collections::BTreeMap;
    use std::io::Write;
    use std::sync::Mutex;

    const VALID_ESTIMATE: &str = r#"{
  "lighting_consumption": 1200.0,
  "hvac_consumption": 2700.0,
  "equipment_consumption": 1100.0,
  "total_annual_consumption": 5000.0,
  "energy_intensity": 50.0,
  "recommendations": [
    {"title": "Daylight sensors", "description": "Dim perimeter lighting",
     "potential_savings_kwh": 240.0, "implementation_cost_jod": 300.0, "payback_years": 4.5}
  ]
}"#;

    #[derive(Debug, Default)]
    struct MockClient {
        output: Option<String>,
        err: Option<RemoteError>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl MockClient {
        fn returning(output: &str) -> Self {
            Self {
                output: Some(output.to_string()),
                ..Default::default()
            }
        }

        fn failing(err: RemoteError) -> Self {
            Self {
                err: Some(err),
                ..Default::default()
            }
        }
    }

    impl CompletionClient for MockClient {
        fn complete(&self, request: &CompletionRequest) -> Result<String, RemoteError> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(err) = &self.err {
                return Err(err.clone());
            }
            Ok(self.output.clone().unwrap_or_default())
        }
    }

    fn record() -> BuildingDataRecord {
        let space = |name: &str, area: f64| SpaceRecord {
            name: name.to_string(),
            area,
            volume: 0.0,
            space_type: "OFFICE".to_string(),
            description: String::new(),
            elevation: 0.0,
            properties: BTreeMap::new(),
        };
        BuildingDataRecord {
            spaces: vec![space("A", 40.0), space("B", 60.0)],
            total_floor_area: 100.0,
            ..Default::default()
        }
    }

    fn remote_with(client: MockClient) -> RemoteEstimator<MockClient> {
        RemoteEstimator::new(RemoteEstimatorConfig::new("secret"), client)
    }

    #[test]
    fn test_accepts_valid_estimate() {
        let remote = remote_with(MockClient::returning(VALID_ESTIMATE));
        let result = remote.estimate(&record());

        assert_eq!(result.total_annual_consumption, 5000.0);
        assert_eq!(result.peak_demand, None);
        assert_eq!(result.calculation_method, remote_method("gpt-4"));
        assert_eq!(result.recommendations.len(), 1);
        assert_eq!(result.recommendations[0].payback_years, 4.5);
    }

    #[test]
    fn test_sends_prompt_with_building_data() {
        let remote = remote_with(MockClient::returning(VALID_ESTIMATE));
        remote.estimate(&record());

        let requests = remote.client.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system_prompt, SYSTEM_PROMPT);
        assert_eq!(requests[0].model, "gpt-4");
        assert!(requests[0].user_prompt.contains("Total floor area: 100.0 m²"));
        assert!(requests[0].user_prompt.contains("Number of spaces: 2"));
        assert!(requests[0].user_prompt.contains("COP 3.0"));
    }

    #[test]
    fn test_accepts_fenced_json() {
        let output = format!("Here is the estimate:\n```json\n{}\n```\nThanks.", VALID_ESTIMATE);
        let result = parse_estimate(&output, "gpt-4").unwrap();
        assert_eq!(result.energy_intensity, 50.0);
    }

    #[test]
    fn test_transport_failure_falls_back() {
        let remote = remote_with(MockClient::failing(RemoteError::Http {
            message: "timeout".to_string(),
        }));
        assert_eq!(remote.estimate(&record()), estimator::estimate(&record()));
    }

    #[test]
    fn test_schema_violations_fall_back() {
        let missing_key = r#"{"lighting_consumption": 1.0, "recommendations": []}"#;
        let negative = VALID_ESTIMATE.replace("1200.0", "-1200.0");
        let long_payback = VALID_ESTIMATE.replace("4.5", "12.0");
        let zero_payback = VALID_ESTIMATE.replace("4.5", "0");
        let not_a_number = VALID_ESTIMATE.replace("1200.0", "\"lots\"");

        for output in [
            missing_key.to_string(),
            negative,
            long_payback,
            zero_payback,
            not_a_number,
            "I cannot help with that.".to_string(),
            String::new(),
        ] {
            let remote = remote_with(MockClient::returning(&output));
            assert!(remote.try_estimate(&record()).is_err(), "accepted {output}");
            assert_eq!(remote.estimate(&record()), estimator::estimate(&record()));
        }
    }

    #[test]
    fn test_config_from_env_defaults() {
        let mut vars = BTreeMap::new();
        vars.insert(ENV_LLM_API_KEY.to_string(), "secret".to_string());

        let config = RemoteEstimatorConfig::from_env_with(|key| vars.get(key).cloned()).unwrap();
        assert_eq!(config, RemoteEstimatorConfig::new("secret"));
    }

    #[test]
    fn test_config_errors() {
        let empty: BTreeMap<String, String> = BTreeMap::new();
        assert_eq!(
            RemoteEstimatorConfig::from_env_with(|key| empty.get(key).cloned()),
            Err(RemoteConfigError::MissingValue {
                key: ENV_LLM_API_KEY
            })
        );

        let mut vars = BTreeMap::new();
        vars.insert(ENV_LLM_API_KEY.to_string(), "  ".to_string());
        assert_eq!(
            RemoteEstimatorConfig::from_env_with(|key| vars.get(key).cloned()),
            Err(RemoteConfigError::EmptyValue {
                key: ENV_LLM_API_KEY
            })
        );

        vars.insert(ENV_LLM_API_KEY.to_string(), "secret".to_string());
        vars.insert(ENV_LLM_TIMEOUT_MS.to_string(), "soon".to_string());
        assert_eq!(
            RemoteEstimatorConfig::from_env_with(|key| vars.get(key).cloned()),
            Err(RemoteConfigError::InvalidTimeout {
                value: "soon".to_string()
            })
        );
    }

    #[test]
    fn test_config_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
IFC_ENERGY_LLM_MODEL = "gpt-4o-mini"
IFC_ENERGY_LLM_BASE_URL = "https://llm.example.com/v1"
IFC_ENERGY_LLM_API_KEY = "file-secret"
IFC_ENERGY_LLM_TIMEOUT_MS = 4567
"#
        )
        .unwrap();

        let config = RemoteEstimatorConfig::from_config_file(file.path()).unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.base_url, "https://llm.example.com/v1");
        assert_eq!(config.api_key, "file-secret");
        assert_eq!(config.timeout_ms, 4567);
    }

    #[test]
    fn test_config_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = RemoteEstimatorConfig::from_config_file(&dir.path().join("nope.toml"));
        assert!(matches!(
            missing,
            Err(RemoteConfigError::ReadConfigFile { .. })
        ));

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "not = [valid").unwrap();
        assert!(matches!(
            RemoteEstimatorConfig::from_config_file(file.path()),
            Err(RemoteConfigError::ParseConfigFile { .. })
        ));
    }

    #[test]
    fn test_extract_json_block() {
        assert_eq!(extract_json_block("x {\"a\":1} y"), Some("{\"a\":1}"));
        assert_eq!(extract_json_block("} nothing {"), None);
        assert_eq!(extract_json_block("plain text"), None);
    }
}
