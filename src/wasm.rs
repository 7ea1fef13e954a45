#![cfg(target_arch = "wasm32")]

use crate::algorithms::flocking::FlockParams;
use crate::engine::{run_variant, variant_catalog, Engine, RunConfig, Variant, VariantInfo};
use crate::models::flock::{snapshot_from_clusters, snapshot_from_states, Cluster};
use crate::sim::Snapshot;
use crate::vector::Vec2;
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn available_variants() -> js_sys::Array {
    let out = js_sys::Array::new();
    for info in variant_catalog() {
        out.push(&variant_info_to_js(info));
    }
    out
}

#[wasm_bindgen]
pub fn flock_defaults() -> JsValue {
    let params = FlockParams::default();
    serde_wasm_bindgen::to_value(&params).unwrap_or(JsValue::NULL)
}

/// Run a whole seeded simulation and return every frame flattened to
/// [x0, y0, x1, y1, ...] (frame-major).
#[wasm_bindgen]
pub fn simulate(
    variant_id: &str,
    flock_size: usize,
    steps: usize,
    seed: u64,
    params: JsValue,
) -> Result<Vec<f64>, JsValue> {
    let variant = parse_variant(variant_id)?;
    let params = params_from_js(params)?;
    let run = RunConfig {
        flock_size,
        steps,
        seed,
    };
    let history = run_variant(variant, &params, &run).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(history.positions_flat())
}

fn variant_info_to_js(info: &VariantInfo) -> JsValue {
    let obj = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&obj, &JsValue::from_str("id"), &JsValue::from_str(info.id));
    let _ = js_sys::Reflect::set(&obj, &JsValue::from_str("name"), &JsValue::from_str(info.name));
    let _ = js_sys::Reflect::set(
        &obj,
        &JsValue::from_str("description"),
        &JsValue::from_str(info.description),
    );
    JsValue::from(obj)
}

fn parse_variant(id: &str) -> Result<Variant, JsValue> {
    Variant::from_id(id).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn params_from_js(params: JsValue) -> Result<FlockParams, JsValue> {
    if params.is_undefined() || params.is_null() {
        return Ok(FlockParams::default());
    }
    serde_wasm_bindgen::from_value(params)
        .map_err(|e| JsValue::from_str(&format!("invalid flock params: {}", e)))
}

#[wasm_bindgen]
pub struct WasmFlock {
    engine: Engine,
}

#[wasm_bindgen]
impl WasmFlock {
    #[wasm_bindgen(constructor)]
    pub fn new(variant_id: &str, flock_size: usize, seed: u64) -> Result<WasmFlock, JsValue> {
        let variant = parse_variant(variant_id)?;
        let run = RunConfig {
            flock_size,
            seed,
            ..RunConfig::default()
        };
        let engine = Engine::seeded(variant, &FlockParams::default(), &run)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(WasmFlock { engine })
    }

    /// Build from packed states [x, y, vx, vy]* and optional params.
    #[wasm_bindgen(js_name = "newFromStates")]
    pub fn new_from_states(variant_id: &str, states: Vec<f64>, params: JsValue) -> Result<WasmFlock, JsValue> {
        let variant = parse_variant(variant_id)?;
        let params = params_from_js(params)?;
        let initial = snapshot_from_states(&states).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let engine =
            Engine::new(variant, &params, initial).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(WasmFlock { engine })
    }

    /// Build from a config object:
    /// {
    ///   variant?: string,
    ///   params?: FlockParams,
    ///   agents?: [{ position: [x, y], velocity: [vx, vy] }],
    ///   clusters?: [{ shape?: "disc" | "ring" | "circle", count, center: [x, y], radius, velocity?: [vx, vy], radialSpeed?: f64 }]
    /// }
    #[wasm_bindgen(js_name = "newFromConfig")]
    pub fn new_from_config(config: JsValue) -> Result<WasmFlock, JsValue> {
        let cfg: CustomConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("invalid config: {}", e)))?;
        let variant = parse_variant(cfg.variant.as_deref().unwrap_or("grid"))?;
        let params = cfg.params.clone().unwrap_or_default();
        let initial = build_custom_snapshot(&cfg)?;
        let engine =
            Engine::new(variant, &params, initial).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(WasmFlock { engine })
    }

    pub fn len(&self) -> usize { self.engine.len() }

    pub fn variant(&self) -> String { self.engine.variant().id().to_string() }

    pub fn step(&mut self) { self.engine.step(); }

    pub fn positions(&self) -> Vec<f64> { self.engine.positions_flat() }

    /// Stable agent id of every slot, matching `positions`.
    pub fn ids(&self) -> Vec<u32> {
        self.engine.latest().ids.iter().map(|&id| id as u32).collect()
    }

    pub fn states(&self) -> Vec<f64> {
        self.engine.latest().state_matrix().into_iter().flatten().collect()
    }
}

#[derive(Debug, Deserialize)]
struct CustomConfig {
    #[serde(default)]
    variant: Option<String>,
    #[serde(default)]
    params: Option<FlockParams>,
    #[serde(default)]
    agents: Vec<CustomAgent>,
    #[serde(default)]
    clusters: Vec<Cluster>,
}

#[derive(Debug, Deserialize)]
struct CustomAgent {
    position: [f64; 2],
    velocity: [f64; 2],
}

fn build_custom_snapshot(cfg: &CustomConfig) -> Result<Snapshot, JsValue> {
    let agents: Vec<(Vec2, Vec2)> = cfg
        .agents
        .iter()
        .map(|a| {
            (
                Vec2::new(a.position[0], a.position[1]),
                Vec2::new(a.velocity[0], a.velocity[1]),
            )
        })
        .collect();
    snapshot_from_clusters(&agents, &cfg.clusters).map_err(|e| JsValue::from_str(&e.to_string()))
}
