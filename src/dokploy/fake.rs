//! In-memory Dokploy used by unit tests.
//!
//! Implements [`DokployApi`] over a small mutable model and records every
//! call so tests can assert on counts and ordering.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::error::{ApiError, Result};

use super::client::DokployApi;
use super::gateway::endpoints;

/// A recorded request.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub body: Value,
}

#[derive(Debug, Clone)]
struct FakeProject {
    id: String,
    name: String,
    description: String,
}

#[derive(Debug, Clone)]
struct FakeEnvironment {
    id: String,
    name: String,
    project_id: String,
}

#[derive(Debug, Clone)]
struct FakeApplication {
    id: String,
    name: String,
    environment_id: String,
    body: Value,
    domains: Vec<Value>,
}

#[derive(Debug, Default)]
struct State {
    projects: Vec<FakeProject>,
    environments: Vec<FakeEnvironment>,
    applications: Vec<FakeApplication>,
    servers: Vec<(String, String)>,
    failures: HashMap<String, (u16, String)>,
    calls: Vec<Call>,
    next_id: u32,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn application_json(app: &FakeApplication) -> Value {
        let mut value = app.body.clone();
        if let Value::Object(map) = &mut value {
            map.insert(String::from("applicationId"), json!(app.id));
            map.insert(String::from("name"), json!(app.name));
            map.insert(String::from("environmentId"), json!(app.environment_id));
            map.insert(String::from("domains"), Value::Array(app.domains.clone()));
        }
        value
    }

    fn environment_json(&self, env: &FakeEnvironment) -> Value {
        let applications: Vec<Value> = self
            .applications
            .iter()
            .filter(|a| a.environment_id == env.id)
            .map(Self::application_json)
            .collect();

        json!({
            "environmentId": env.id,
            "name": env.name,
            "projectId": env.project_id,
            "applications": applications,
        })
    }

    fn project_json(&self, project: &FakeProject) -> Value {
        let environments: Vec<Value> = self
            .environments
            .iter()
            .filter(|e| e.project_id == project.id)
            .map(|e| self.environment_json(e))
            .collect();

        json!({
            "projectId": project.id,
            "name": project.name,
            "description": project.description,
            "environments": environments,
        })
    }
}

/// In-memory Dokploy.
#[derive(Debug, Default)]
pub struct FakeDokploy {
    state: Mutex<State>,
}

impl FakeDokploy {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn add_server(&self, name: &str) -> String {
        let mut state = self.state();
        let id = state.next_id("srv");
        state.servers.push((id.clone(), name.to_string()));
        id
    }

    pub fn add_project(&self, name: &str) -> String {
        let mut state = self.state();
        let id = state.next_id("prj");
        state.projects.push(FakeProject {
            id: id.clone(),
            name: name.to_string(),
            description: String::new(),
        });
        id
    }

    pub fn add_environment(&self, project_id: &str, name: &str) -> String {
        let mut state = self.state();
        let id = state.next_id("env");
        state.environments.push(FakeEnvironment {
            id: id.clone(),
            name: name.to_string(),
            project_id: project_id.to_string(),
        });
        id
    }

    pub fn add_application(&self, environment_id: &str, name: &str) -> String {
        let mut state = self.state();
        let id = state.next_id("app");
        state.applications.push(FakeApplication {
            id: id.clone(),
            name: name.to_string(),
            environment_id: environment_id.to_string(),
            body: json!({}),
            domains: Vec::new(),
        });
        id
    }

    pub fn add_domain(&self, application_id: &str, host: &str) -> String {
        let mut state = self.state();
        let id = state.next_id("dom");
        if let Some(app) = state.applications.iter_mut().find(|a| a.id == application_id) {
            app.domains.push(json!({
                "domainId": id,
                "host": host,
                "path": "/",
                "port": 8080,
                "https": true,
                "certificateType": "letsencrypt",
                "stripPath": false,
            }));
        }
        id
    }

    /// Makes every subsequent call to `path` fail with the given status.
    pub fn fail_on(&self, path: &str, status: u16, message: &str) {
        self.state()
            .failures
            .insert(path.to_string(), (status, message.to_string()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Paths of all POST calls, in order.
    pub fn post_paths(&self) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .filter(|c| c.method == "POST")
            .map(|c| c.path.clone())
            .collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.state().calls.iter().filter(|c| c.path == path).count()
    }

    pub fn last_body(&self, path: &str) -> Option<Value> {
        self.state()
            .calls
            .iter()
            .rev()
            .find(|c| c.path == path)
            .map(|c| c.body.clone())
    }

    fn record(state: &mut State, method: &'static str, path: &str, body: Value) -> Result<()> {
        state.calls.push(Call {
            method,
            path: path.to_string(),
            body,
        });
        match state.failures.get(path) {
            Some((status, message)) => Err(ApiError::remote(*status, message.clone()).into()),
            None => Ok(()),
        }
    }
}

fn not_found(what: &str) -> crate::error::DeployError {
    ApiError::remote(404, format!("{what} not found")).into()
}

fn str_field<'v>(body: &'v Value, key: &str) -> &'v str {
    body.get(key).and_then(Value::as_str).unwrap_or_default()
}

#[async_trait]
impl DokployApi for FakeDokploy {
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let mut state = self.state();
        let params: Map<String, Value> = query
            .iter()
            .map(|(k, v)| ((*k).to_string(), json!(v)))
            .collect();
        let params = Value::Object(params);
        Self::record(&mut state, "GET", path, params.clone())?;

        match path {
            endpoints::PROJECT_ALL => Ok(Value::Array(
                state.projects.iter().map(|p| state.project_json(p)).collect(),
            )),
            endpoints::PROJECT_ONE => {
                let id = str_field(&params, "projectId");
                state
                    .projects
                    .iter()
                    .find(|p| p.id == id)
                    .map(|p| state.project_json(p))
                    .ok_or_else(|| not_found("Project"))
            }
            endpoints::ENVIRONMENT_ONE => {
                let id = str_field(&params, "environmentId");
                state
                    .environments
                    .iter()
                    .find(|e| e.id == id)
                    .map(|e| state.environment_json(e))
                    .ok_or_else(|| not_found("Environment"))
            }
            endpoints::SERVER_ALL => Ok(Value::Array(
                state
                    .servers
                    .iter()
                    .map(|(id, name)| json!({ "serverId": id, "name": name }))
                    .collect(),
            )),
            endpoints::APPLICATION_ONE => {
                let id = str_field(&params, "applicationId");
                state
                    .applications
                    .iter()
                    .find(|a| a.id == id)
                    .map(State::application_json)
                    .ok_or_else(|| not_found("Application"))
            }
            other => Err(not_found(other)),
        }
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let mut state = self.state();
        Self::record(&mut state, "POST", path, body.clone())?;

        match path {
            endpoints::PROJECT_CREATE => {
                let id = state.next_id("prj");
                state.projects.push(FakeProject {
                    id: id.clone(),
                    name: str_field(body, "name").to_string(),
                    description: str_field(body, "description").to_string(),
                });
                Ok(json!({ "project": { "projectId": id }, "environment": null }))
            }
            endpoints::ENVIRONMENT_CREATE => {
                let id = state.next_id("env");
                state.environments.push(FakeEnvironment {
                    id: id.clone(),
                    name: str_field(body, "name").to_string(),
                    project_id: str_field(body, "projectId").to_string(),
                });
                Ok(json!({ "environmentId": id }))
            }
            endpoints::APPLICATION_CREATE => {
                let id = state.next_id("app");
                state.applications.push(FakeApplication {
                    id: id.clone(),
                    name: str_field(body, "name").to_string(),
                    environment_id: str_field(body, "environmentId").to_string(),
                    body: body.clone(),
                    domains: Vec::new(),
                });
                Ok(json!({ "applicationId": id, "name": str_field(body, "name") }))
            }
            endpoints::DOMAIN_CREATE => {
                let id = state.next_id("dom");
                let app_id = str_field(body, "applicationId").to_string();
                let app = state
                    .applications
                    .iter_mut()
                    .find(|a| a.id == app_id)
                    .ok_or_else(|| not_found("Application"))?;
                let mut domain = body.clone();
                if let Value::Object(map) = &mut domain {
                    map.insert(String::from("domainId"), json!(id));
                }
                app.domains.push(domain.clone());
                Ok(domain)
            }
            endpoints::DOMAIN_REMOVE => {
                let id = str_field(body, "domainId").to_string();
                for app in &mut state.applications {
                    app.domains.retain(|d| str_field(d, "domainId") != id);
                }
                Ok(json!(true))
            }
            endpoints::APPLICATION_UPDATE
            | endpoints::APPLICATION_SAVE_DOCKER_PROVIDER
            | endpoints::APPLICATION_SAVE_ENVIRONMENT
            | endpoints::APPLICATION_STOP
            | endpoints::APPLICATION_DEPLOY => {
                let id = str_field(body, "applicationId");
                if state.applications.iter().any(|a| a.id == id) {
                    Ok(json!(true))
                } else {
                    Err(not_found("Application"))
                }
            }
            other => Err(not_found(other)),
        }
    }
}
