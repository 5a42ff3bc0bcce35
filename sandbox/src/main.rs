// Copyright 2025 eraflo
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

//! Drives a simulated frame loop that prepares a batch of in-memory sprites.
//!
//! Usage: `sandbox [settings.ron]`

use anyhow::{Context, Result};
use image::{ImageFormat, Rgba, RgbaImage};
use prism_agents::{PrepareAgent, PrepareEvent};
use prism_core::{
    AlphaMode, ImageContentResource, PrepareSettings, ResourceOptions, TextureBinding,
};
use prism_lanes::MemoryImageSource;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SPRITE_COUNT: u32 = 24;
const FRAME_TIME: Duration = Duration::from_millis(16);
const MAX_FRAMES: u64 = 240;

fn encode_sprite(index: u32) -> Result<Vec<u8>> {
    let size = 64 + index * 16;
    let image = RgbaImage::from_fn(size, size, |x, y| {
        Rgba([(x * 255 / size) as u8, (y * 255 / size) as u8, (index * 10) as u8, 255])
    });
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .with_context(|| format!("Failed to encode sprite {index}"))?;
    Ok(bytes)
}

fn load_settings() -> Result<PrepareSettings> {
    match std::env::args().nth(1) {
        Some(path) => PrepareSettings::load_from_file(&path)
            .with_context(|| format!("Failed to load settings from '{path}'")),
        None => Ok(PrepareSettings {
            create_image_bitmap: true,
            frame_time_limit_ms: 4.0,
            ..PrepareSettings::default()
        }),
    }
}

fn build_sprites() -> Result<HashMap<String, Arc<ImageContentResource>>> {
    let mut sprites = HashMap::new();
    for index in 0..SPRITE_COUNT {
        let name = format!("sprite/{index:02}");
        let mut options = ResourceOptions::default().with_auto_load(false);
        if index % 3 == 0 {
            options = options.with_alpha_mode(AlphaMode::PremultipliedAlpha);
        }
        let source = MemoryImageSource::new(encode_sprite(index)?).with_url(&name);
        sprites.insert(name, ImageContentResource::new(Arc::new(source), options)?);
    }

    let mut corrupt = encode_sprite(0)?;
    corrupt.truncate(corrupt.len() / 3);
    let source = MemoryImageSource::new(corrupt).with_url("sprite/corrupt");
    sprites.insert(
        "sprite/corrupt".to_string(),
        ImageContentResource::new(Arc::new(source), ResourceOptions::default())?,
    );
    Ok(sprites)
}

#[tokio::main]
async fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let settings = load_settings()?;
    settings
        .clone()
        .install()
        .context("Failed to install preparation settings")?;

    let sprites = Arc::new(build_sprites()?);
    let bindings: Arc<Mutex<HashMap<String, TextureBinding>>> = Arc::default();

    let mut agent: PrepareAgent<String> = PrepareAgent::from_settings(&settings);
    let table = Arc::clone(&sprites);
    let uploaded = Arc::clone(&bindings);
    agent.queue_mut().register_handler(
        "sprite",
        |name: &String| name.starts_with("sprite/"),
        move |name: &String| table.get(name).cloned().into_iter().collect(),
        move |name: &String, resources: &[Arc<ImageContentResource>]| {
            let mut bindings = uploaded.lock().unwrap_or_else(|e| e.into_inner());
            for resource in resources {
                let mut binding = TextureBinding::new();
                if let Err(err) = binding.bind(resource) {
                    log::warn!("Could not bind '{name}': {err}");
                    continue;
                }
                let bytes = resource.bitmap().map_or(0, |bitmap| bitmap.byte_len());
                let alpha_mode = binding.alpha_mode();
                log::debug!(
                    "Uploaded '{name}' ({}x{}, {bytes} bytes, {alpha_mode:?}, gpu premultiply: {})",
                    resource.width(),
                    resource.height(),
                    alpha_mode.is_premultiplied_on_gpu()
                );
                bindings.insert(name.clone(), binding);
            }
        },
    );

    let mut names: Vec<&String> = sprites.keys().collect();
    names.sort();
    let events = agent.queue().events();
    let mut done = None;
    for name in names {
        done = Some(agent.queue_mut().upload(name.clone()));
    }
    let mut done = done.context("No sprites were queued")?;

    let mut interval = tokio::time::interval(FRAME_TIME);
    loop {
        interval.tick().await;
        let report = agent.update();
        if report.made_progress() {
            log::info!(
                "Frame {}: uploaded {}, failed {}, {} pending{}",
                agent.report_status().frame_count,
                report.uploaded,
                report.failed,
                report.pending_after,
                if report.budget_exhausted {
                    " (budget exhausted)"
                } else {
                    ""
                }
            );
        }

        for event in events.try_iter() {
            if let PrepareEvent::LoadFailed { item, error } = event {
                log::warn!("'{item}' will not be uploaded: {error}");
            }
        }

        if done.try_recv().is_ok() {
            break;
        }
        let status = agent.report_status();
        if status.frame_count >= MAX_FRAMES || status.is_stalled {
            log::warn!("Stopping early: {}", status.message);
            break;
        }
    }

    let status = agent.report_status();
    let premultiplied = bindings
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .values()
        .filter(|binding| binding.alpha_mode() == AlphaMode::PremultipliedAlpha)
        .count();
    log::info!(
        "Done after {} frames: {} uploaded ({} premultiplied), {} failed, last tick {:.3} ms",
        status.frame_count,
        status.total_uploaded,
        premultiplied,
        status.total_failed,
        status.last_tick_ms
    );

    for resource in sprites.values() {
        resource.destroy();
    }
    Ok(())
}
