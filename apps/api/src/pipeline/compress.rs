//! OnePageCompressor: the static shaping pass, always applied last before
//! skill rows and section ordering, regardless of band.
//!
//! A single band→limits table governs list caps and string truncation.
//! Compression is idempotent: applying it twice equals applying it once.

use crate::models::resume::ResumeRecord;
use crate::pipeline::sanitize::renormalize_certifications;
use crate::pipeline::text::truncate_chars;
use crate::pipeline::{approx_char_count, Band, BandThresholds};

/// Richness below this shows the summary; at or above, the page space goes
/// to concrete content instead.
const SUMMARY_RICHNESS_CUTOFF: usize = 6;

/// Per-band shaping limits. Short-band records get the generous end of the
/// table; long-band records the strict end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandLimits {
    pub max_bullets_experience: usize,
    pub max_bullets_project: usize,
    pub max_experience: usize,
    pub max_projects: usize,
    pub max_education: usize,
    pub max_certifications: usize,
    pub max_publications: usize,
    pub max_skills: usize,
    pub summary_chars: usize,
    pub entry_summary_chars: usize,
    pub bullet_chars: usize,
}

impl BandLimits {
    pub fn for_band(band: Band) -> Self {
        match band {
            Band::Short => BandLimits {
                max_bullets_experience: 4,
                max_bullets_project: 4,
                max_experience: 4,
                max_projects: 3,
                max_education: 2,
                max_certifications: 6,
                max_publications: 3,
                max_skills: 12,
                summary_chars: 280,
                entry_summary_chars: 220,
                bullet_chars: 200,
            },
            Band::Mid => BandLimits {
                max_bullets_experience: 3,
                max_bullets_project: 3,
                max_experience: 3,
                max_projects: 2,
                max_education: 2,
                max_certifications: 6,
                max_publications: 2,
                max_skills: 10,
                summary_chars: 220,
                entry_summary_chars: 180,
                bullet_chars: 180,
            },
            Band::Long => BandLimits {
                max_bullets_experience: 2,
                max_bullets_project: 2,
                max_experience: 3,
                max_projects: 2,
                max_education: 2,
                max_certifications: 5,
                max_publications: 2,
                max_skills: 8,
                summary_chars: 200,
                entry_summary_chars: 160,
                bullet_chars: 160,
            },
        }
    }
}

pub fn compress(record: ResumeRecord, thresholds: &BandThresholds) -> ResumeRecord {
    let band = Band::classify(approx_char_count(&record), thresholds);
    compress_with(record, BandLimits::for_band(band))
}

pub fn compress_with(mut record: ResumeRecord, limits: BandLimits) -> ResumeRecord {
    record.summary = truncate_chars(&record.summary, limits.summary_chars);

    record.experience.truncate(limits.max_experience);
    for entry in &mut record.experience {
        entry.summary = truncate_chars(&entry.summary, limits.entry_summary_chars);
        entry.bullets.truncate(limits.max_bullets_experience);
        for bullet in &mut entry.bullets {
            *bullet = truncate_chars(bullet, limits.bullet_chars);
        }
    }

    record.projects.truncate(limits.max_projects);
    for entry in &mut record.projects {
        entry.summary = truncate_chars(&entry.summary, limits.entry_summary_chars);
        entry.bullets.truncate(limits.max_bullets_project);
        for bullet in &mut entry.bullets {
            *bullet = truncate_chars(bullet, limits.bullet_chars);
        }
    }

    record.education.truncate(limits.max_education);

    // Certifications: re-normalize, dedup by identity key, then cap.
    let mut seen = std::collections::HashSet::new();
    record.certifications = renormalize_certifications(&record.certifications)
        .into_iter()
        .filter(|c| seen.insert(c.dedup_key()))
        .take(limits.max_certifications)
        .collect();

    record.publications.truncate(limits.max_publications);
    for publication in &mut record.publications {
        *publication = truncate_chars(publication, limits.entry_summary_chars);
    }
    record.skills.truncate(limits.max_skills);

    // Summary display: when the page already has enough concrete content,
    // drop the summary entirely so the section enforcer (which keys off
    // presence) stays in agreement.
    record.show_summary =
        richness(&record) < SUMMARY_RICHNESS_CUTOFF && !record.summary.is_empty();
    if !record.show_summary {
        record.summary.clear();
    }

    record
}

/// Coarse content score: populated experience entries + non-empty skills +
/// education entries.
pub fn richness(record: &ResumeRecord) -> usize {
    let populated_experience = record
        .experience
        .iter()
        .filter(|e| !e.title.is_empty() || !e.company.is_empty())
        .count();
    let skills = record.skills.iter().filter(|s| !s.is_empty()).count();
    populated_experience + skills + record.education.len()
}
