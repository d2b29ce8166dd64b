// Copyright 2024 RisingWave Labs
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

//! Typed session properties (§6.1, §10.3): a small registry with documented defaults, representable
//! as a flat string map at the boundary with whatever session layer a caller already has.

use std::collections::HashMap;

use relplan_error::{PlannerError, Result};

macro_rules! session_config {
    ($($(#[$meta:meta])* $field:ident : $ty:ty = $default:expr => $key:literal),+ $(,)?) => {
        /// Per-query optimizer behavior flags (§6.1). Defaults mirror widely-deployed planner
        /// defaults; a caller's own session layer may override any subset via
        /// [`SessionConfig::from_flat_map`].
        #[derive(Clone, Debug, PartialEq)]
        pub struct SessionConfig {
            $($(#[$meta])* pub $field: $ty,)+
        }

        impl Default for SessionConfig {
            fn default() -> Self {
                Self {
                    $($field: $default,)+
                }
            }
        }

        impl SessionConfig {
            /// Parses a flat string map (the wire representation a caller's session layer hands
            /// over), falling back to this field's default for any key that's absent. Unknown keys
            /// are ignored: a newer caller talking to an older core should not fail outright.
            pub fn from_flat_map(map: &HashMap<String, String>) -> Result<Self> {
                let defaults = Self::default();
                Ok(Self {
                    $(
                        $field: match map.get($key) {
                            Some(v) => parse_bool(v).map_err(|e| {
                                PlannerError::type_mismatch(format!(
                                    "session property {}: {e}", $key
                                ))
                            })?,
                            None => defaults.$field,
                        },
                    )+
                })
            }

            pub fn to_flat_map(&self) -> HashMap<String, String> {
                let mut out = HashMap::new();
                $(out.insert($key.to_string(), self.$field.to_string());)+
                out
            }
        }
    };
}

fn parse_bool(v: &str) -> std::result::Result<bool, String> {
    match v {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(format!("expected a boolean, got {other:?}")),
    }
}

session_config! {
    /// Whether predicate pushdown (§4.4) synthesizes dynamic filters at equi-joins.
    enable_dynamic_filtering: bool = true => "enable_dynamic_filtering",
    /// Whether exchange insertion (§4.5) may skip a `Sort` already satisfied by its child's
    /// actual ordering.
    skip_redundant_sort: bool = true => "skip_redundant_sort",
    /// Whether a `RowNumber` immediately capped by a `Filter` is folded into `TopNRowNumber`.
    optimize_topn_row_number: bool = true => "optimize_topn_row_number",
    /// Forces every output fragment to run single-node regardless of what exchange insertion
    /// would otherwise compute.
    force_single_node_output: bool = false => "force_single_node_output",
    distributed_index_join_enabled: bool = false => "distributed_index_join_enabled",
    scale_writers: bool = false => "scale_writers",
    redistribute_writes: bool = true => "redistribute_writes",
    colocated_join_enabled: bool = true => "colocated_join_enabled",
    prefer_streaming_operators: bool = false => "prefer_streaming_operators",
    distributed_sort_enabled: bool = false => "distributed_sort_enabled",
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = SessionConfig::default();
        assert!(cfg.enable_dynamic_filtering);
        assert!(cfg.skip_redundant_sort);
        assert!(cfg.optimize_topn_row_number);
        assert!(!cfg.force_single_node_output);
        assert!(!cfg.distributed_index_join_enabled);
        assert!(!cfg.scale_writers);
        assert!(cfg.redistribute_writes);
        assert!(cfg.colocated_join_enabled);
        assert!(!cfg.prefer_streaming_operators);
        assert!(!cfg.distributed_sort_enabled);
    }

    #[test]
    fn from_flat_map_overrides_only_present_keys() {
        let mut map = HashMap::new();
        map.insert("enable_dynamic_filtering".to_string(), "false".to_string());
        let cfg = SessionConfig::from_flat_map(&map).unwrap();
        assert!(!cfg.enable_dynamic_filtering);
        assert!(cfg.skip_redundant_sort);
    }

    #[test]
    fn round_trips_through_flat_map() {
        let cfg = SessionConfig::default();
        let map = cfg.to_flat_map();
        let restored = SessionConfig::from_flat_map(&map).unwrap();
        assert_eq!(cfg, restored);
    }

    #[test]
    fn rejects_non_boolean_value() {
        let mut map = HashMap::new();
        map.insert("scale_writers".to_string(), "maybe".to_string());
        assert!(SessionConfig::from_flat_map(&map).is_err());
    }
}
