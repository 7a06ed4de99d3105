//! Hysteresis for the overlay icon.
//!
//! The text label follows the window majority immediately. The icon only
//! switches after it has been held for `hold_frames` frames and the window
//! agrees strongly enough on a different label.

use crate::classify::Emotion;
use crate::pipeline::smoothing::Vote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IconStability {
    #[default]
    Unset,
    Holding { label: Emotion, frames_held: u32 },
}

impl IconStability {
    /// Advance by one frame.
    ///
    /// `vote` is `None` when the smoothing window is empty, in which case
    /// nothing changes. Returns `true` when the held label changed.
    pub fn update(&mut self, vote: Option<&Vote>, hold_frames: u32, change_threshold: f32) -> bool {
        let Some(vote) = vote else {
            return false;
        };

        match *self {
            IconStability::Unset => {
                *self = IconStability::Holding {
                    label: vote.label,
                    frames_held: 0,
                };
                true
            }
            IconStability::Holding { label, frames_held } if frames_held < hold_frames => {
                *self = IconStability::Holding {
                    label,
                    frames_held: frames_held + 1,
                };
                false
            }
            IconStability::Holding { label, .. } => {
                if vote.consensus >= change_threshold && vote.label != label {
                    *self = IconStability::Holding {
                        label: vote.label,
                        frames_held: 0,
                    };
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Label whose icon is currently shown.
    pub fn held(&self) -> Option<Emotion> {
        match self {
            IconStability::Unset => None,
            IconStability::Holding { label, .. } => Some(*label),
        }
    }
}
