use crate::acquisition::channel::ChannelMetadata;
use crate::prelude::{ChannelMode, PipelineError, PipelineResult, PulseType};
use crate::telemetry::log::LogManager;

/// Mode and pulse labels derived for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelClass {
    pub mode: ChannelMode,
    pub pulse: PulseType,
}

impl ChannelClass {
    pub fn from_metadata(metadata: &ChannelMetadata) -> Self {
        Self {
            mode: if metadata.passive {
                ChannelMode::Passive
            } else {
                ChannelMode::Active
            },
            pulse: if metadata.fm {
                PulseType::Fm
            } else {
                PulseType::Cw
            },
        }
    }
}

/// Classification of every channel in a survey, in reader order.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    entries: Vec<(String, ChannelClass)>,
}

impl Classification {
    pub fn classify(metadata: &[ChannelMetadata]) -> Self {
        let entries = metadata
            .iter()
            .map(|m| (m.id.clone(), ChannelClass::from_metadata(m)))
            .collect();
        Self { entries }
    }

    pub fn get(&self, channel_id: &str) -> Option<ChannelClass> {
        self.entries
            .iter()
            .find(|(id, _)| id == channel_id)
            .map(|(_, class)| *class)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids of the channels matching both labels; an empty match is an error.
    pub fn select(&self, mode: ChannelMode, pulse: PulseType) -> PipelineResult<Vec<String>> {
        let selected: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, class)| class.mode == mode && class.pulse == pulse)
            .map(|(id, _)| id.clone())
            .collect();

        if selected.is_empty() {
            LogManager::new().flag(&format!(
                "none of {} channels is {} {}",
                self.entries.len(),
                mode,
                pulse
            ));
            return Err(PipelineError::NoChannelsSelected { mode, pulse });
        }
        Ok(selected)
    }
}
