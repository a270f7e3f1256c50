//! Shared fixtures and tracing setup for Concord tests
//!
//! The source fixtures describe one small user service from three sides
//! (Go backend, TypeScript frontend, Python SDK) that disagree in known
//! ways:
//! - the frontend calls `PUT /users/{id}`, which the backend lacks
//! - the backend exposes `DELETE /users/{id}`, which the frontend never calls
//! - the SDK names the user parameter `{user_id}` where the backend uses `{id}`

#![allow(missing_docs)]

use concord_contract::{Contract, HttpMethod, Operation, Schema};
use std::sync::Once;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const GO_BACKEND: &str = r#"package main

import "github.com/gin-gonic/gin"

func main() {
	r := gin.Default()
	r.GET("/users", listUsers)
	r.POST("/users", createUser)
	r.GET("/users/:id", getUser)
	r.DELETE("/users/:id", deleteUser)
	r.Run()
}
"#;

pub const GO_MODELS: &str = r#"package models

type CreateUserRequest struct {
	Email    string `json:"email"`
	Password string `json:"password"`
	Age      int    `json:"age,omitempty"`
}

type User struct {
	ID    int64  `json:"id"`
	Email string `json:"email"`
}
"#;

pub const TS_FRONTEND: &str = r#"import axios from 'axios';

export async function listUsers() {
  return fetch(`${API_BASE}/users`);
}

export async function createUser(body: NewUser) {
  return fetch('/users', { method: 'POST', body: JSON.stringify(body) });
}

export async function getUser(id: string) {
  return axios.get<User>(`/users/${id}`);
}

export async function updateUser(id: string, body: NewUser) {
  return axios.put(`/users/${id}`, body);
}

export interface NewUser {
  email: string;
  password: string;
}
"#;

pub const PY_SDK: &str = r#"import requests


class UsersClient:
    def __init__(self, base_url: str):
        self.base_url = base_url

    def list_users(self) -> list:
        return requests.get(f"{self.base_url}/users").json()

    def create_user(self, email: str, password: str) -> dict:
        return requests.post(f"{self.base_url}/users", json={"email": email}).json()

    def get_user(self, user_id: str) -> dict:
        return requests.get(f"{self.base_url}/users/{user_id}").json()
"#;

pub const REQUIREMENTS_MD: &str = r#"# User service

Users sign up with an email address.

### GET /users
Response: {users: array}

### POST /users
Request: {email, password: string, age?: integer}

#### Response
- id: integer
- email: string

### GET /users/{id}
Response: {id: integer, email}

### DELETE /users/{id}
"#;

pub const SAMPLE_CONTRACT_YAML: &str = r#"openapi: 3.0.3
info:
  title: Users
  version: 1.0.0
paths:
  /users:
    get:
      responses:
        "200":
          description: Success
          content:
            application/json:
              schema:
                type: object
    post:
      requestBody:
        required: true
        content:
          application/json:
            schema:
              type: object
              properties:
                email:
                  type: string
              required:
                - email
      responses:
        "200":
          description: Success
"#;

/// Parsed [`SAMPLE_CONTRACT_YAML`]
pub fn sample_contract() -> Contract {
    Contract::from_yaml(SAMPLE_CONTRACT_YAML).expect("sample contract parses")
}

/// Contract with bare operations at the given endpoints
pub fn contract_with(endpoints: &[(&str, HttpMethod)]) -> Contract {
    let mut contract = Contract::new("fixture", "0.0.0");
    for (path, method) in endpoints {
        contract.insert_operation(
            *path,
            *method,
            Operation::new().with_response("200", Schema::object()),
        );
    }
    contract
}

/// Install a test-writer subscriber filtered by `RUST_LOG`, once per process
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}
