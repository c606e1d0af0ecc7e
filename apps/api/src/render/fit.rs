//! Render-compile-shrink loop.
//!
//! Renders the record, compiles it, and accepts only a one-page result. Too
//! long means shrink and retry: four standard passes with monotonically
//! stricter limits, then three ultra-squeeze passes, then give up. Compile
//! errors abort the loop at once; a broken document will not get better by
//! shrinking.

use tracing::{debug, info};

use crate::models::resume::ResumeRecord;
use crate::pipeline::compress::{compress_with, BandLimits};
use crate::pipeline::order::{enforce, SectionPolicy};
use crate::render::compile::{CompileError, Compiler};
use crate::render::template::{self, TemplateError};

const STANDARD_PASSES: u32 = 4;
const ULTRA_PASSES: u32 = 3;

#[derive(Debug)]
pub struct Fitted {
    pub pdf: Vec<u8>,
    pub source: String,
    pub record: ResumeRecord,
    /// Number of compile attempts it took.
    pub attempts: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum FitError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("content cannot be reduced to a single page after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

pub async fn fit_to_page(
    mut record: ResumeRecord,
    compiler: &dyn Compiler,
    policy: &SectionPolicy,
) -> Result<Fitted, FitError> {
    let mut attempts = 0u32;

    for pass in 1..=STANDARD_PASSES {
        attempts += 1;
        let source = template::render(&record)?;
        let compiled = compiler.compile(&source).await?;
        if compiled.pages <= 1 {
            info!(attempts, "document fits on one page");
            return Ok(Fitted {
                pdf: compiled.pdf,
                source,
                record,
                attempts,
            });
        }
        debug!(pass, pages = compiled.pages, "over a page, shrinking");
        record = enforce(shrink(record, pass), policy);
    }

    for squeeze in 1..=ULTRA_PASSES {
        record = enforce(ultra_squeeze(record, squeeze), policy);
        attempts += 1;
        let source = template::render(&record)?;
        let compiled = compiler.compile(&source).await?;
        if compiled.pages <= 1 {
            info!(attempts, "document fits after ultra-squeeze");
            return Ok(Fitted {
                pdf: compiled.pdf,
                source,
                record,
                attempts,
            });
        }
        debug!(squeeze, pages = compiled.pages, "still over a page");
    }

    Err(FitError::Exhausted { attempts })
}

/// Standard shrink passes. Each pass's limits are at least as strict as the
/// previous pass's.
fn shrink(mut record: ResumeRecord, pass: u32) -> ResumeRecord {
    let limits = match pass {
        1 => BandLimits {
            max_bullets_experience: 3,
            max_bullets_project: 3,
            max_experience: 4,
            max_projects: 3,
            max_education: 2,
            max_certifications: 4,
            max_publications: 2,
            max_skills: 10,
            summary_chars: 180,
            entry_summary_chars: 150,
            bullet_chars: 150,
        },
        2 => BandLimits {
            max_bullets_experience: 2,
            max_bullets_project: 2,
            max_experience: 3,
            max_projects: 2,
            max_education: 2,
            max_certifications: 3,
            max_publications: 1,
            max_skills: 8,
            summary_chars: 140,
            entry_summary_chars: 120,
            bullet_chars: 130,
        },
        3 => {
            record.summary.clear();
            record.certifications.clear();
            record.publications.clear();
            BandLimits {
                max_bullets_experience: 2,
                max_bullets_project: 2,
                max_experience: 3,
                max_projects: 2,
                max_education: 2,
                max_certifications: 0,
                max_publications: 0,
                max_skills: 8,
                summary_chars: 0,
                entry_summary_chars: 110,
                bullet_chars: 120,
            }
        }
        _ => BandLimits {
            max_bullets_experience: 2,
            max_bullets_project: 1,
            max_experience: 2,
            max_projects: 2,
            max_education: 2,
            max_certifications: 0,
            max_publications: 0,
            max_skills: 6,
            summary_chars: 0,
            entry_summary_chars: 0,
            bullet_chars: 110,
        },
    };
    compress_with(record, limits)
}

/// Last-resort squeezes. Progressively strips the record down to the bare
/// identity-plus-experience core so the bounded loop actually makes progress
/// on every iteration.
fn ultra_squeeze(mut record: ResumeRecord, iteration: u32) -> ResumeRecord {
    record.summary.clear();
    record.publications.clear();

    record.certifications.truncate(2);
    for cert in &mut record.certifications {
        cert.description.clear();
    }

    record.education.truncate(1);
    for entry in &mut record.education {
        entry.details.truncate(1);
    }

    record.projects.truncate(1);
    for entry in &mut record.projects {
        entry.summary.clear();
        entry.bullets.truncate(1);
    }

    record.skills.truncate(6);

    let max_experience = match iteration {
        1 => 2,
        _ => 1,
    };
    let max_bullets = if iteration >= 3 { 0 } else { 1 };
    record.experience.truncate(max_experience);
    for entry in &mut record.experience {
        entry.summary.clear();
        entry.bullets.truncate(max_bullets);
        for bullet in &mut entry.bullets {
            *bullet = crate::pipeline::text::truncate_chars(bullet, 100);
        }
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{CertificationEntry, EducationEntry, ExperienceEntry, ProjectEntry};
    use crate::render::compile::testing::ScriptedCompiler;

    fn dense_record() -> ResumeRecord {
        let record = ResumeRecord {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            summary: "s".repeat(260),
            skills: (0..12).map(|i| format!("skill{i}")).collect(),
            experience: (0..4)
                .map(|i| ExperienceEntry {
                    title: format!("Role {i}"),
                    company: "Acme".into(),
                    bullets: (0..4).map(|j| format!("bullet {j}")).collect(),
                    ..Default::default()
                })
                .collect(),
            projects: (0..3)
                .map(|i| ProjectEntry {
                    name: format!("proj{i}"),
                    bullets: vec!["did a thing".into()],
                    ..Default::default()
                })
                .collect(),
            education: vec![EducationEntry {
                degree: "BSc".into(),
                details: vec!["Algorithms".into(), "Networks".into()],
                ..Default::default()
            }],
            certifications: vec![CertificationEntry {
                name: "Cert".into(),
                ..Default::default()
            }],
            publications: vec!["Paper".into()],
            ..Default::default()
        };
        enforce(record, &SectionPolicy::standard())
    }

    #[tokio::test]
    async fn test_accepts_first_single_page_result() {
        let compiler = ScriptedCompiler::pages(vec![1]);
        let fitted = fit_to_page(dense_record(), &compiler, &SectionPolicy::standard())
            .await
            .unwrap();
        assert_eq!(fitted.attempts, 1);
        assert_eq!(compiler.call_count(), 1);
    }

    #[tokio::test]
    async fn test_shrinks_until_it_fits() {
        let compiler = ScriptedCompiler::pages(vec![2, 2, 1]);
        let fitted = fit_to_page(dense_record(), &compiler, &SectionPolicy::standard())
            .await
            .unwrap();
        assert_eq!(fitted.attempts, 3);
        // Two shrink passes applied: pass-2 limits are in force.
        assert!(fitted.record.experience.len() <= 3);
        assert!(fitted
            .record
            .experience
            .iter()
            .all(|e| e.bullets.len() <= 2));
    }

    #[tokio::test]
    async fn test_bounded_termination() {
        let compiler = ScriptedCompiler::pages(vec![2; 20]);
        let err = fit_to_page(dense_record(), &compiler, &SectionPolicy::standard())
            .await
            .unwrap_err();
        match err {
            FitError::Exhausted { attempts } => {
                assert_eq!(attempts, STANDARD_PASSES + ULTRA_PASSES)
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert_eq!(
            compiler.call_count() as u32,
            STANDARD_PASSES + ULTRA_PASSES
        );
    }

    #[tokio::test]
    async fn test_compile_error_aborts_immediately() {
        let compiler = ScriptedCompiler::failing();
        let err = fit_to_page(dense_record(), &compiler, &SectionPolicy::standard())
            .await
            .unwrap_err();
        assert!(matches!(err, FitError::Compile(_)));
        assert_eq!(compiler.call_count(), 1);
    }

    #[test]
    fn test_ultra_squeeze_progressively_smaller() {
        let a = ultra_squeeze(dense_record(), 1);
        let b = ultra_squeeze(a.clone(), 2);
        let c = ultra_squeeze(b.clone(), 3);
        assert!(a.experience.len() >= b.experience.len());
        assert!(b.experience.len() >= c.experience.len());
        assert!(c.experience.iter().all(|e| e.bullets.is_empty()));
        assert!(c.summary.is_empty());
        assert!(c.projects.len() <= 1);
        assert!(c.skills.len() <= 6);
    }
}
