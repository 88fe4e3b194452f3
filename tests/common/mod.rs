//! Shared test helpers: an in-memory `security` stand-in.

#![allow(dead_code)]

use kodegen_bundler_keychain::{Result, SecurityCommand, SecurityOutput, SecurityRunner};
use std::sync::Mutex;

/// Records every command it is asked to run and answers from a script.
///
/// By default each command succeeds and prints `"<subcommand> ok\n"`.
/// `fail_at(n, ..)` makes the n-th command (zero based) exit non-zero.
#[derive(Default)]
pub struct ScriptedRunner {
    calls: Mutex<Vec<Vec<String>>>,
    failure: Option<(usize, i32, String)>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_at(mut self, index: usize, code: i32, stderr: &str) -> Self {
        self.failure = Some((index, code, stderr.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn subcommands(&self) -> Vec<String> {
        self.calls().into_iter().map(|argv| argv[0].clone()).collect()
    }
}

impl SecurityRunner for ScriptedRunner {
    async fn run(&self, command: &SecurityCommand) -> Result<SecurityOutput> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(
                command
                    .argv()
                    .map(|arg| arg.to_string_lossy().into_owned())
                    .collect(),
            );
            calls.len() - 1
        };

        match &self.failure {
            Some((at, code, stderr)) if *at == index => {
                Ok(SecurityOutput::failed(*code, stderr.clone()))
            }
            _ => Ok(SecurityOutput::ok(format!("{} ok\n", command.subcommand()))),
        }
    }
}
