//! Named tuning presets and their JSON document.
//!
//! A [`PresetLibrary`] keeps one list for the attitude loop and one for the
//! stability assist. Presets hold plain tuning snapshots; loading one into a
//! controller goes through the controller's `apply_tunings`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::AutopilotConfig;
use crate::error::PresetError;
use crate::gnc::{AssistTunings, AttitudeTunings};

/// Name given to the preset built from the configured tunings.
pub const DEFAULT_PRESET: &str = "default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset<T> {
    pub name: String,
    pub tunings: T,
}

// ---------------------------------------------------------------------------
// One preset list
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct PresetList<T> {
    presets: Vec<Preset<T>>,
    #[serde(default)]
    active: Option<String>,
}

impl<T> Default for PresetList<T> {
    fn default() -> Self {
        Self {
            presets: Vec::new(),
            active: None,
        }
    }
}

impl<T: Clone> PresetList<T> {
    /// Add a preset. Names must be non-empty and unique.
    pub fn register(&mut self, name: &str, tunings: T) -> Result<&Preset<T>, PresetError> {
        let name = name.trim();
        if name.is_empty() {
            log::warn!("rejected preset with no name");
            return Err(PresetError::EmptyName);
        }
        if self.find(name).is_some() {
            log::warn!("rejected duplicate preset `{}`", name);
            return Err(PresetError::DuplicateName(name.to_string()));
        }
        self.presets.push(Preset {
            name: name.to_string(),
            tunings,
        });
        let index = self.presets.len() - 1;
        Ok(&self.presets[index])
    }

    pub fn remove(&mut self, name: &str) -> Result<Preset<T>, PresetError> {
        let index = self
            .presets
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| PresetError::NotFound(name.to_string()))?;
        if self.active.as_deref() == Some(name) {
            self.active = None;
        }
        Ok(self.presets.remove(index))
    }

    pub fn find(&self, name: &str) -> Option<&Preset<T>> {
        self.presets.iter().find(|p| p.name == name)
    }

    pub fn get(&self, name: &str) -> Result<&Preset<T>, PresetError> {
        self.find(name)
            .ok_or_else(|| PresetError::NotFound(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn active(&self) -> Option<&Preset<T>> {
        self.active.as_deref().and_then(|name| self.find(name))
    }

    /// Mark `name` active and return its tunings.
    pub fn activate(&mut self, name: &str) -> Result<T, PresetError> {
        let tunings = self.get(name)?.tunings.clone();
        self.active = Some(name.to_string());
        Ok(tunings)
    }

    /// Overwrite the active preset with `tunings`.
    pub fn update_active(&mut self, tunings: T) -> Result<(), PresetError> {
        let name = self.active.clone().ok_or(PresetError::NoActive)?;
        let preset = self
            .presets
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or(PresetError::NotFound(name))?;
        preset.tunings = tunings;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Library (both lists) and its document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetLibrary {
    pub attitude: PresetList<AttitudeTunings>,
    pub assist: PresetList<AssistTunings>,
}

impl PresetLibrary {
    /// Library holding one active `default` preset per list, built from
    /// the configured tunings.
    pub fn with_defaults(config: &AutopilotConfig) -> Self {
        let mut library = Self::default();
        library.ensure_defaults(config);
        library
    }

    /// Add the `default` presets if a loaded document lacks them, and
    /// activate them where nothing else is active.
    pub fn ensure_defaults(&mut self, config: &AutopilotConfig) {
        if self.attitude.find(DEFAULT_PRESET).is_none() {
            self.attitude.presets.insert(
                0,
                Preset { name: DEFAULT_PRESET.to_string(), tunings: config.attitude },
            );
        }
        if self.assist.find(DEFAULT_PRESET).is_none() {
            self.assist.presets.insert(
                0,
                Preset { name: DEFAULT_PRESET.to_string(), tunings: config.assist },
            );
        }
        if self.attitude.active().is_none() {
            self.attitude.active = Some(DEFAULT_PRESET.to_string());
        }
        if self.assist.active().is_none() {
            self.assist.active = Some(DEFAULT_PRESET.to_string());
        }
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), PresetError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Parse a preset document. A preset with unusable limits fails the
    /// whole document.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PresetError> {
        let library: Self = serde_json::from_reader(reader)?;
        for preset in &library.attitude.presets {
            if let Some((id, limits)) = preset.tunings.invalid_limits() {
                return Err(PresetError::InvalidLimits {
                    preset: preset.name.clone(),
                    channel: id.name(),
                    limits,
                });
            }
        }
        for preset in &library.assist.presets {
            if let Some((axis, limits)) = preset.tunings.invalid_limits() {
                return Err(PresetError::InvalidLimits {
                    preset: preset.name.clone(),
                    channel: axis.name(),
                    limits,
                });
            }
        }
        Ok(library)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PresetError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PresetError> {
        let reader = BufReader::new(File::open(path)?);
        Self::from_reader(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> PresetLibrary {
        PresetLibrary::with_defaults(&AutopilotConfig::default())
    }

    #[test]
    fn defaults_are_registered_and_active() {
        let lib = library();
        assert_eq!(lib.attitude.active().unwrap().name, DEFAULT_PRESET);
        assert_eq!(lib.assist.active().unwrap().tunings, AssistTunings::default());
    }

    #[test]
    fn register_rejects_empty_and_duplicate_names() {
        let mut lib = library();
        assert!(matches!(lib.attitude.register("  ", AttitudeTunings::default()), Err(PresetError::EmptyName)));
        assert!(matches!(
            lib.attitude.register(DEFAULT_PRESET, AttitudeTunings::default()),
            Err(PresetError::DuplicateName(n)) if n == DEFAULT_PRESET
        ));
        lib.attitude.register("glider", AttitudeTunings::default()).unwrap();
        assert_eq!(lib.attitude.len(), 2);
        assert_eq!(lib.attitude.names().collect::<Vec<_>>(), vec![DEFAULT_PRESET, "glider"]);
    }

    #[test]
    fn activate_update_and_remove() {
        let mut lib = library();
        let mut t = AssistTunings::default();
        t.roll.kp = 0.4;
        lib.assist.register("aerobatic", t).unwrap();
        let loaded = lib.assist.activate("aerobatic").unwrap();
        assert_eq!(loaded.roll.kp, 0.4);

        t.roll.kp = 0.6;
        lib.assist.update_active(t).unwrap();
        assert_eq!(lib.assist.find("aerobatic").unwrap().tunings.roll.kp, 0.6);

        lib.assist.remove("aerobatic").unwrap();
        assert!(lib.assist.active().is_none());
        let err = lib.assist.update_active(t).unwrap_err();
        assert!(matches!(err, PresetError::NoActive));
        assert_eq!(err.to_string(), "no preset is active");
        assert!(matches!(lib.assist.remove("aerobatic"), Err(PresetError::NotFound(_))));
    }

    #[test]
    fn document_round_trip() {
        let mut lib = library();
        let mut t = AttitudeTunings::default();
        t.throttle.kd = 0.3;
        lib.attitude.register("heavy", t).unwrap();
        lib.attitude.activate("heavy").unwrap();

        let mut buf = Vec::new();
        lib.to_writer(&mut buf).unwrap();
        let back = PresetLibrary::from_reader(buf.as_slice()).unwrap();
        assert_eq!(back, lib);
        assert_eq!(back.attitude.active().unwrap().name, "heavy");
    }

    #[test]
    fn loaded_document_gains_defaults() {
        let json = r#"{ "attitude": { "presets": [ { "name": "a", "tunings": {} } ] } }"#;
        let mut lib = PresetLibrary::from_reader(json.as_bytes()).unwrap();
        assert!(lib.assist.is_empty());
        lib.ensure_defaults(&AutopilotConfig::default());
        assert_eq!(lib.attitude.names().collect::<Vec<_>>(), vec![DEFAULT_PRESET, "a"]);
        assert_eq!(lib.assist.len(), 1);
    }

    #[test]
    fn preset_with_inverted_limits_is_rejected() {
        let json = r#"{ "attitude": { "presets": [
            { "name": "broken", "tunings": { "heading_bank": { "kp": 2, "out_min": 30, "out_max": -30 } } }
        ] } }"#;
        let err = PresetLibrary::from_reader(json.as_bytes()).unwrap_err();
        assert!(matches!(
            &err,
            PresetError::InvalidLimits { preset, channel: "heading-bank", limits: "output" } if preset == "broken"
        ));
    }

    #[test]
    fn partial_preset_keeps_channel_defaults() {
        let json = r#"{ "assist": { "presets": [ { "name": "soft", "tunings": { "yaw": { "kp": 0.05 } } } ] } }"#;
        let lib = PresetLibrary::from_reader(json.as_bytes()).unwrap();
        let yaw = lib.assist.get("soft").unwrap().tunings.yaw;
        assert_eq!(yaw.kp, 0.05);
        assert_eq!(yaw.kd, AssistTunings::default().yaw.kd);
        assert_eq!(yaw.scale(), 3.0);
    }

    #[test]
    fn malformed_and_missing_documents() {
        assert!(matches!(PresetLibrary::from_reader("[1, 2".as_bytes()), Err(PresetError::Parse(_))));
        assert!(matches!(PresetLibrary::load("/no/such/presets.json"), Err(PresetError::Io(_))));
    }

    #[test]
    fn save_and_load_file() {
        let path = std::env::temp_dir().join(format!("pilot-assist-presets-{}.json", std::process::id()));
        let lib = library();
        lib.save(&path).unwrap();
        let back = PresetLibrary::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(back, lib);
    }
}
