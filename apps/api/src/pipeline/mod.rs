//! The content-fitting and document-assembly pipeline.
//!
//! Strict stage order for a single request:
//! Sanitize → Enrich → (Merge) → Expand → Compress → SkillRows →
//! EnforceOrder → Fit. Each stage's output is the next stage's entire input;
//! the pipeline is a pure function of (raw_text, job_desc, baseline) apart
//! from the two injected LLM stages.

pub mod certs;
pub mod compress;
pub mod enrich;
pub mod expand;
pub mod merge;
pub mod order;
pub mod prompts;
pub mod sanitize;
pub mod skills;
pub mod text;

use tracing::info;

use crate::llm::{service, Llm};
use crate::models::resume::ResumeRecord;
use crate::pipeline::order::SectionPolicy;

/// Approximate-size classification of a record. Chooses how aggressively to
/// expand or compress content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Short,
    Mid,
    Long,
}

/// Band boundaries over the approximate character count. These are tuned
/// against one template's font and margins and are configuration, not
/// invariants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandThresholds {
    /// Counts strictly below this are Short.
    pub short_below: usize,
    /// Counts at or above this are Long.
    pub long_at: usize,
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            short_below: 1650,
            long_at: 2900,
        }
    }
}

impl Band {
    pub fn classify(count: usize, thresholds: &BandThresholds) -> Band {
        if count < thresholds.short_below {
            Band::Short
        } else if count < thresholds.long_at {
            Band::Mid
        } else {
            Band::Long
        }
    }
}

/// Character-count proxy for rendered page space across all textual fields.
/// A rough heuristic, not an exact rendered length.
pub fn approx_char_count(record: &ResumeRecord) -> usize {
    let mut count = record.summary.chars().count();
    for e in &record.experience {
        count += e.title.chars().count()
            + e.company.chars().count()
            + e.summary.chars().count()
            + e.bullets.iter().map(|b| b.chars().count()).sum::<usize>();
    }
    for p in &record.projects {
        count += p.name.chars().count()
            + p.tech.chars().count()
            + p.summary.chars().count()
            + p.bullets.iter().map(|b| b.chars().count()).sum::<usize>();
    }
    for edu in &record.education {
        count += edu.degree.chars().count()
            + edu.institution.chars().count()
            + edu.details.iter().map(|d| d.chars().count()).sum::<usize>();
    }
    for c in &record.certifications {
        count += c.name.chars().count() + c.description.chars().count();
    }
    count += record.skills.iter().map(|s| s.chars().count()).sum::<usize>();
    count += record
        .publications
        .iter()
        .map(|p| p.chars().count())
        .sum::<usize>();
    count
}

/// Runs the full shaping pipeline over raw resume text and a job
/// description, producing a render-ready record.
///
/// The two mandatory structured calls (extraction, optimization) are allowed
/// to come back empty; the result then flows through as a near-empty record
/// rather than aborting the request.
pub async fn tailor(
    raw_text: &str,
    job_desc: &str,
    llm: &dyn Llm,
    thresholds: &BandThresholds,
    policy: &SectionPolicy,
) -> ResumeRecord {
    let baseline_value = service::extract_structured(llm, raw_text).await;
    let baseline = enrich::enrich(sanitize::sanitize(&baseline_value), raw_text);

    let optimized_text = service::optimize(llm, raw_text, job_desc).await;
    let record = if optimized_text.is_empty() {
        info!("optimization returned nothing; continuing with baseline record");
        baseline
    } else {
        let optimized_value = service::extract_structured(llm, &optimized_text).await;
        merge::merge_records(baseline, sanitize::sanitize(&optimized_value))
    };

    shape(record, raw_text, Some(job_desc), llm, thresholds, policy).await
}

/// The shaping tail shared by every entry point: expand, compress, build
/// skill rows, enforce section order.
pub async fn shape(
    record: ResumeRecord,
    raw_text: &str,
    job_desc: Option<&str>,
    llm: &dyn Llm,
    thresholds: &BandThresholds,
    policy: &SectionPolicy,
) -> ResumeRecord {
    let record = expand::expand(record, raw_text, llm, thresholds).await;
    let mut record = compress::compress(record, thresholds);

    let rows = skills::build_skill_rows(llm, raw_text, job_desc, &record.skills).await;
    record.skills_row1 = rows.row1;
    record.skills_row2 = rows.row2;
    record.skills_row3 = rows.row3;
    record.skills = rows.flat;

    order::enforce(record, policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::ExperienceEntry;

    #[test]
    fn test_band_boundaries() {
        let t = BandThresholds::default();
        assert_eq!(Band::classify(0, &t), Band::Short);
        assert_eq!(Band::classify(1649, &t), Band::Short);
        assert_eq!(Band::classify(1650, &t), Band::Mid);
        assert_eq!(Band::classify(2899, &t), Band::Mid);
        assert_eq!(Band::classify(2900, &t), Band::Long);
    }

    #[test]
    fn test_approx_char_count_sums_fields() {
        let record = ResumeRecord {
            summary: "12345".into(),
            skills: vec!["abc".into()],
            experience: vec![ExperienceEntry {
                title: "ab".into(),
                company: "cd".into(),
                bullets: vec!["efg".into()],
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(approx_char_count(&record), 5 + 3 + 2 + 2 + 3);
    }

    #[tokio::test]
    async fn test_tailor_survives_unresponsive_llm() {
        use crate::llm::testing::ScriptedLlm;
        use crate::pipeline::order::SectionPolicy;

        let llm = ScriptedLlm::failing();
        let record = tailor(
            "Some resume text",
            "Some job description",
            &llm,
            &BandThresholds::default(),
            &SectionPolicy::standard(),
        )
        .await;
        // Near-empty record, never a panic or error.
        assert!(record.experience.is_empty());
        assert!(record.section_order.is_empty());
    }
}
