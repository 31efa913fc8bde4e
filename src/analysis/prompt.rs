use std::{fmt, str::FromStr};

/// Relative serving size used to scale the calorie estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PortionSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl PortionSize {
    pub const ALL: [PortionSize; 3] = [PortionSize::Small, PortionSize::Medium, PortionSize::Large];

    pub fn as_str(&self) -> &'static str {
        match self {
            PortionSize::Small => "Small",
            PortionSize::Medium => "Medium",
            PortionSize::Large => "Large",
        }
    }
}

impl fmt::Display for PortionSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown portion size: {0}")]
pub struct UnknownPortionSize(pub String);

impl FromStr for PortionSize {
    type Err = UnknownPortionSize;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PortionSize::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| UnknownPortionSize(s.to_string()))
    }
}

pub fn build_prompt(portion: PortionSize) -> String {
    format!(
        r#"
You are an expert nutritionist. Analyze the food items in the image and provide:
1. Calorie content for each item based on a {portion} portion.
2. A total calorie count.
3. Macronutrient breakdown (carbs, protein, fats).
4. Whether the meal is healthy, balanced, or unhealthy.
5. Suggestions for making the meal healthier.

Format the response as:
1. Item 1 - no. of calories
2. Item 2 - no. of calories
---
Total: XX calories
Macronutrients: Carbs - Xg, Protein - Yg, Fats - Zg
Health Status: Healthy/Balanced/Unhealthy
Suggestions: ...
"#
    )
}
