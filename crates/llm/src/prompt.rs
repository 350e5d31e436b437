use delivery_guard_core::{AnalysisRequest, CoreError};

/// Persona sent as the system message of every analysis request.
pub const SYSTEM_ROLE: &str = "You are an expert Senior Technical Architect and Delivery Manager \
with 20+ years of experience in enterprise software delivery.";

/// Instruction payload for one analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPrompt {
    pub system_role: String,
    pub user_prompt: String,
}

/// Interpolates the request into the fixed estimation template.
///
/// Pure: identical requests produce identical prompts.
///
/// # Errors
/// Returns `CoreError::InvalidInput` if `requirements` is blank.
pub fn build_prompt(request: &AnalysisRequest) -> Result<AnalysisPrompt, CoreError> {
    request.validate()?;

    let user_prompt = format!(
        r"Act as an AI-powered Delivery Risk & Effort Estimation Engine.

Input Data:
- Business Requirements: {requirements}
- Expected Timelines: {timelines}
- Constraints: {constraints}

Your tasks:
1. Analyze the business requirements deeply.
2. Identify functional complexity and non-functional constraints.
3. Estimate development effort and delivery risk level.
4. Highlight high-risk modules.
5. Recommend suitable application architecture and tech stack.
6. Suggest test strategy and quality gates.
7. Ensure business alignment and practical recommendations.

Return the result strictly as a structured JSON object matching the provided schema.",
        requirements = request.requirements.trim(),
        timelines = request.timelines.trim(),
        constraints = request.constraints.trim(),
    );

    Ok(AnalysisPrompt { system_role: SYSTEM_ROLE.to_owned(), user_prompt })
}
