//! Prompt construction for the form/policy comparison.

use super::sections::Section;

/// Build the single user message sent to the completion endpoint.
///
/// Both texts are embedded verbatim.
pub fn build_comparison_prompt(form_text: &str, policy_text: &str) -> String {
    format!(
        r#"
You are an expert in IRB policies. Given an IRB form and an institution's IRB policy, identify key alignment areas and flag inconsistencies.

IRB Form:
{form_text}

Policy:
{policy_text}

Respond using exactly these three sections, in this order, each starting with its label exactly as written:

{compliant}
List the parts of the form that satisfy the policy.

{concerns}
List any inconsistencies, gaps, or mismatches between the form and the policy.

{recommendations}
List concrete changes that would bring the form into compliance.
"#,
        compliant = Section::Compliant.marker(),
        concerns = Section::Concerns.marker(),
        recommendations = Section::Recommendations.marker(),
    )
}
