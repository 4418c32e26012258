use crate::models::MockupConfiguration;

/// Which side of the garment a generation call renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Front,
    Back,
}

impl View {
    pub fn label(self) -> &'static str {
        match self {
            View::Front => "FRONT VIEW",
            View::Back => "BACK VIEW",
        }
    }
}

/// Fixed mockup phrasing. Downstream consumers match on this text, so keep it byte-for-byte.
pub fn build_prompt(
    clothing_type: &str,
    base_color: &str,
    fit: &str,
    branding_style: &str,
    placement: &str,
    design_prompt: &str,
) -> String {
    format!("Professional product mockup of a {fit} fit {clothing_type} in {base_color} color. {branding_style} branding style on the {placement}. Design: {design_prompt}. High quality, photorealistic, studio lighting, white background, professional product photography.")
}

pub fn prompt_for(config: &MockupConfiguration) -> String {
    build_prompt(
        &config.clothing_type,
        &config.base_color,
        &config.fit,
        &config.branding_style,
        &config.placement,
        &config.design_prompt,
    )
}

pub fn with_view(prompt: &str, view: View) -> String {
    format!("{} - {}", prompt, view.label())
}
