//! Instruction text for image-generation requests.
//!
//! Each preservation flag maps to a fixed clause, so the same configuration
//! and context always produce the same instruction.

use crate::models::GenerationConfig;

pub const VARIANT_TASK: &str =
    "Generate a new professional photograph based on the provided reference image.";
pub const MARKETING_TASK: &str =
    "Transform the provided photo into a polished marketing image for a product campaign.";

pub const LABEL_CLAUSE: &str = "PRODUCT FIDELITY: Reproduce every product label, logo and printed \
text exactly as it appears in the reference, pixel for pixel. Do not invent, alter, blur or \
translate any lettering and never hallucinate new text.";

pub const STRICT_POSE_CLAUSE: &str = "POSE: Mimic the subject's pose strictly. Keep the exact \
limb positions, head tilt and the precise angle of the hand grip on the product.";
pub const FREE_POSE_CLAUSE: &str = "POSE: You have creative freedom with the pose. Choose a \
natural, dynamic stance that shows the product well.";

pub const KEEP_FACE_CLAUSE: &str = "IDENTITY: Retain the person's face and identity exactly. \
Facial features, skin tone, hairstyle and expression must stay recognisably the same person.";
pub const REPLACE_FACE_CLAUSE: &str = "IDENTITY: Replace the person with a newly generated model \
who fits the product's target demographic in age, style and look. Do not reproduce the \
original face.";

pub const LOCK_LOCATION_CLAUSE: &str = "BACKGROUND: Keep the original background and location \
locked. Do not move, replace or restyle the surroundings.";

pub const COLOR_STYLE_CLAUSE: &str = "STYLE: Commercial photography with vibrant, true-to-life \
colour, soft studio lighting and a clean, high-end finish.";
pub const MONOCHROME_STYLE_CLAUSE: &str = "STYLE: High-contrast black and white photography with \
deep blacks, bright highlights and dramatic monochrome lighting.";

const DEFAULT_SCENE: &str = "SCENE: Choose a fitting, attractive setting for the product.";

/// Builds the instruction from a task line plus the per-flag clauses.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    task: String,
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self {
            task: VARIANT_TASK.to_string(),
        }
    }
}

impl PromptComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn marketing() -> Self {
        Self::with_task(MARKETING_TASK)
    }

    pub fn with_task(task: impl Into<String>) -> Self {
        Self { task: task.into() }
    }

    pub fn compose(&self, config: &GenerationConfig, context: &str) -> String {
        let mut clauses: Vec<String> = vec![self.task.clone()];

        if context.trim().is_empty() {
            clauses.push(DEFAULT_SCENE.to_string());
        } else {
            clauses.push(format!("SCENE: {}", context));
        }

        if config.preserve_product_label {
            clauses.push(LABEL_CLAUSE.to_string());
        }

        clauses.push(
            if config.preserve_pose {
                STRICT_POSE_CLAUSE
            } else {
                FREE_POSE_CLAUSE
            }
            .to_string(),
        );

        clauses.push(
            if config.preserve_face {
                KEEP_FACE_CLAUSE
            } else {
                REPLACE_FACE_CLAUSE
            }
            .to_string(),
        );

        if config.preserve_location {
            clauses.push(LOCK_LOCATION_CLAUSE.to_string());
        }

        clauses.push(
            if config.monochrome {
                MONOCHROME_STYLE_CLAUSE
            } else {
                COLOR_STYLE_CLAUSE
            }
            .to_string(),
        );

        clauses.join("\n\n")
    }
}

/// Composes with the default variant task line.
pub fn compose_instruction(config: &GenerationConfig, context: &str) -> String {
    PromptComposer::default().compose(config, context)
}
