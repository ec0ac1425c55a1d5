//! Two-step form and scripted submitter shared by wizard unit tests

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Mutex;
use tokio::sync::Notify;

use crate::wizard::errors::FieldErrors;
use crate::wizard::form::WizardForm;
use crate::wizard::submit::{SubmitError, SubmitRequest, SubmitResponse, Submitter};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestForm {
    pub name: String,
    pub age: u32,
}

#[derive(Debug, Clone)]
pub enum Field {
    Name(String),
    Age(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestPayload {
    pub name: String,
    pub age: u32,
}

impl WizardForm for TestForm {
    const TOTAL_STEPS: u8 = 2;
    const ENDPOINT: &'static str = "/api/test";
    const SUBMIT_ERROR_MESSAGE: &'static str = "could not save";

    type Update = Field;
    type Payload = TestPayload;

    fn step_title(step: u8) -> &'static str {
        match step {
            1 => "Name",
            _ => "Age",
        }
    }

    fn validate(&self, step: u8) -> FieldErrors {
        let mut errors = FieldErrors::new();
        match step {
            1 if self.name.trim().is_empty() => errors.insert("name", "name is required"),
            2 if !(1..=120).contains(&self.age) => errors.insert("age", "age out of range"),
            _ => {}
        }
        errors
    }

    fn apply(&mut self, update: Field) {
        match update {
            Field::Name(name) => self.name = name,
            Field::Age(age) => self.age = age,
        }
    }

    fn payload(&self) -> TestPayload {
        TestPayload {
            name: self.name.clone(),
            age: self.age,
        }
    }
}

/// Submitter that records requests and replies from a script
pub struct ScriptedSubmitter {
    pub requests: Mutex<Vec<SubmitRequest>>,
    reply: Result<Value, u16>,
    gate: Option<Notify>,
}

impl ScriptedSubmitter {
    pub fn ok(evaluation_id: &str) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            reply: Ok(json!({ "evaluation": { "evaluation_id": evaluation_id } })),
            gate: None,
        }
    }

    pub fn replying(body: Value) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            reply: Ok(body),
            gate: None,
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            reply: Err(status),
            gate: None,
        }
    }

    /// Hold every request until `release` is called
    pub fn gated(mut self) -> Self {
        self.gate = Some(Notify::new());
        self
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Submitter for ScriptedSubmitter {
    async fn submit(&self, request: SubmitRequest) -> Result<SubmitResponse, SubmitError> {
        self.requests.lock().unwrap().push(request);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.reply {
            Ok(body) => Ok(SubmitResponse {
                status: 201,
                body: body.clone(),
            }),
            Err(status) => Err(SubmitError::Rejected {
                status: *status,
                message: "rejected".into(),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
