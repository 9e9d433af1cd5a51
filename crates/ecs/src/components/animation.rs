use std::any::Any;

use serde::{Deserialize, Serialize};

use super::{Dependency, poll_asset};
use crate::component::{Component, ComponentError, ComponentKind, save_fields};
use crate::context::{LoadContext, LogicContext};

/// Playback clock for a clip. Advances only while simulating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Animation {
    pub clip: String,
    pub speed: f32,
    pub looping: bool,
    /// Clip length in seconds.
    pub duration: f32,
    pub autoplay: bool,
    #[serde(skip)]
    time: f32,
    #[serde(skip)]
    playing: bool,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            clip: String::new(),
            speed: 1.0,
            looping: true,
            duration: 1.0,
            autoplay: true,
            time: 0.0,
            playing: false,
        }
    }
}

impl Animation {
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
        self.time = 0.0;
    }

    fn advance(&mut self, dt: f32) {
        if !self.playing || self.duration <= 0.0 {
            return;
        }
        self.time += dt * self.speed;
        if self.looping {
            self.time = self.time.rem_euclid(self.duration);
        } else if self.time >= self.duration {
            self.time = self.duration;
            self.playing = false;
        }
    }
}

impl Component for Animation {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Animation
    }

    /// An empty clip name loads immediately; otherwise waits for the clip.
    fn load(&mut self, ctx: &mut LoadContext<'_>) -> bool {
        if !self.clip.is_empty()
            && !matches!(poll_asset(ctx.assets, &self.clip), Dependency::Ready)
        {
            return false;
        }
        self.time = 0.0;
        self.playing = self.autoplay;
        true
    }

    fn logic(&mut self, ctx: &mut LogicContext<'_>) -> Result<(), ComponentError> {
        if ctx.mode.is_simulating() {
            self.advance(ctx.dt);
        }
        Ok(())
    }

    fn duplicate(&self) -> Box<dyn Component> {
        Box::new(Self {
            time: 0.0,
            playing: false,
            ..self.clone()
        })
    }

    fn save(&self) -> Result<serde_json::Value, ComponentError> {
        save_fields(self.kind(), self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
