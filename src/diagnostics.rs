// Copyright 2024 Kafka Client Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Process-wide diagnostics: a per-component debug-level mapping (spec.md
//! §5, "process-wide state") with no effect on protocol behavior, and a
//! test-only logger initializer for this crate's own integration tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::OnceLock;

fn levels() -> &'static Mutex<HashMap<String, log::LevelFilter>> {
    static LEVELS: OnceLock<Mutex<HashMap<String, log::LevelFilter>>> = OnceLock::new();
    LEVELS.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Sets the diagnostic-only log level for one named component (for
/// example `"transport"` or `"connection"`). Does not change protocol
/// behavior; purely advisory for whatever logger the embedding
/// application installs.
pub fn set_debug_level(component: impl Into<String>, level: log::LevelFilter) {
    levels()
        .lock()
        .expect("debug level map poisoned")
        .insert(component.into(), level);
}

pub fn debug_level(component: &str) -> Option<log::LevelFilter> {
    levels().lock().expect("debug level map poisoned").get(component).copied()
}

/// Installs a stderr logger for this crate's own tests via `logforth`.
/// Not exported for embedding applications to call: a library must not
/// install the process logger on an unsuspecting caller's behalf.
#[cfg(test)]
pub fn init_test_logging() {
    use logforth::append;
    use logforth::filter::env::EnvFilterBuilder;
    use logforth::filter::EnvFilter;
    use logforth::layout;
    use logforth::Dispatch;
    use logforth::Logger;

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string());
    let builder = EnvFilterBuilder::new()
        .try_parse(&filter)
        .unwrap_or_else(|_| panic!("failed to parse filter: {filter}"));

    let _ = Logger::new()
        .dispatch(
            Dispatch::new()
                .filter(EnvFilter::new(builder))
                .layout(layout::TextLayout::default())
                .append(append::Stderr),
        )
        .apply();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_level_round_trips() {
        set_debug_level("transport", log::LevelFilter::Trace);
        assert_eq!(debug_level("transport"), Some(log::LevelFilter::Trace));
        assert_eq!(debug_level("unset-component"), None);
    }
}
