//! LaTeX document builder.
//!
//! Emits a complete single-column article document from a shaped record,
//! walking `section_order` rather than a fixed layout. Every piece of user
//! text goes through `latex_escape` before it touches the source.

use std::fmt::Write;

use thiserror::Error;

use crate::models::resume::{EducationEntry, ExperienceEntry, ProjectEntry, ResumeRecord};

#[derive(Debug, Error)]
#[error("template error at line {line}: {message}")]
pub struct TemplateError {
    pub line: usize,
    pub message: String,
}

const LATEX_SPECIALS: &[(char, &str)] = &[
    ('\\', "\\textbackslash{}"),
    ('{', "\\{"),
    ('}', "\\}"),
    ('#', "\\#"),
    ('$', "\\$"),
    ('%', "\\%"),
    ('&', "\\&"),
    ('_', "\\_"),
    ('~', "\\textasciitilde{}"),
    ('^', "\\textasciicircum{}"),
];

pub fn latex_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match LATEX_SPECIALS.iter().find(|(c, _)| *c == ch) {
            Some((_, rep)) => out.push_str(rep),
            None => out.push(ch),
        }
    }
    out
}

/// "Jan 2021 — Present" style range. Both sides are free text by the time
/// they reach the renderer, so no date parsing happens here.
pub fn date_range(start: &str, end: &str) -> String {
    let start = start.trim();
    let end = end.trim();
    match (start.is_empty(), end.is_empty()) {
        (true, true) => String::new(),
        (false, true) => latex_escape(start),
        (true, false) => latex_escape(end),
        (false, false) => format!("{} --- {}", latex_escape(start), latex_escape(end)),
    }
}

pub fn render(record: &ResumeRecord) -> Result<String, TemplateError> {
    let mut doc = String::new();
    doc.push_str(
        "\\documentclass[11pt]{article}\n\
         \\usepackage[margin=0.6in]{geometry}\n\
         \\usepackage[T1]{fontenc}\n\
         \\usepackage{enumitem}\n\
         \\usepackage{hyperref}\n\
         \\hypersetup{colorlinks=true, urlcolor=blue}\n\
         \\setlist[itemize]{leftmargin=*, itemsep=1pt, topsep=2pt}\n\
         \\pagestyle{empty}\n\
         \\begin{document}\n",
    );

    header(&mut doc, record);

    for (i, section) in record.section_order.iter().enumerate() {
        match section.as_str() {
            "summary" => {
                if record.show_summary && !record.summary.is_empty() {
                    push_section(&mut doc, "Summary");
                    let _ = writeln!(doc, "{}", latex_escape(&record.summary));
                }
            }
            // Links render inside the header line.
            "links" => {}
            "skills" => skills_section(&mut doc, record),
            "experience" => experience_section(&mut doc, &record.experience),
            "projects" => projects_section(&mut doc, &record.projects),
            "education" => education_section(&mut doc, &record.education),
            "certifications" => certifications_section(&mut doc, record),
            "publications" => publications_section(&mut doc, &record.publications),
            other => {
                return Err(TemplateError {
                    line: i + 1,
                    message: format!("unknown section '{other}' in section order"),
                });
            }
        }
    }

    doc.push_str("\\end{document}\n");
    Ok(doc)
}

fn header(doc: &mut String, record: &ResumeRecord) {
    doc.push_str("\\begin{center}\n");
    let _ = writeln!(doc, "{{\\LARGE \\textbf{{{}}}}}\\\\[2pt]", latex_escape(&record.full_name()));

    let contact: Vec<String> = [&record.email, &record.phone, &record.location]
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| latex_escape(s))
        .collect();
    if !contact.is_empty() {
        let _ = writeln!(doc, "{}\\\\", contact.join(" \\textbullet{} "));
    }

    let links: Vec<String> = record
        .links
        .iter()
        .filter(|l| !l.url.trim().is_empty())
        .map(|l| {
            let label = if l.label.trim().is_empty() {
                &l.url
            } else {
                &l.label
            };
            format!("\\href{{{}}}{{{}}}", l.url.trim(), latex_escape(label))
        })
        .collect();
    if !links.is_empty() {
        let _ = writeln!(doc, "{}\\\\", links.join(" \\textbullet{} "));
    }
    doc.push_str("\\end{center}\n");
}

fn push_section(doc: &mut String, title: &str) {
    let _ = writeln!(doc, "\\section*{{{title}}}");
}

fn skills_section(doc: &mut String, record: &ResumeRecord) {
    let rows = [
        ("Languages", &record.skills_row1),
        ("Tools \\& Platforms", &record.skills_row2),
        ("Concepts", &record.skills_row3),
    ];
    let any_row = rows.iter().any(|(_, r)| !r.is_empty());
    if !any_row && record.skills.is_empty() {
        return;
    }
    push_section(doc, "Skills");
    if !any_row {
        let _ = writeln!(doc, "{}", latex_escape(&record.skills.join(", ")));
        return;
    }
    for (label, row) in rows.iter().filter(|(_, r)| !r.is_empty()) {
        let _ = writeln!(doc, "\\textbf{{{label}:}} {}\\\\", latex_escape(row));
    }
}

fn experience_section(doc: &mut String, entries: &[ExperienceEntry]) {
    if entries.is_empty() {
        return;
    }
    push_section(doc, "Experience");
    for e in entries {
        let _ = writeln!(
            doc,
            "\\textbf{{{}}} --- {}{} \\hfill {}\\\\",
            latex_escape(&e.title),
            latex_escape(&e.company),
            if e.location.is_empty() {
                String::new()
            } else {
                format!(", {}", latex_escape(&e.location))
            },
            date_range(&e.start_date, &e.end_date),
        );
        if !e.summary.is_empty() {
            let _ = writeln!(doc, "{}\\\\", latex_escape(&e.summary));
        }
        bullets(doc, &e.bullets);
    }
}

fn projects_section(doc: &mut String, entries: &[ProjectEntry]) {
    if entries.is_empty() {
        return;
    }
    push_section(doc, "Projects");
    for p in entries {
        let name = if p.link.trim().is_empty() {
            format!("\\textbf{{{}}}", latex_escape(&p.name))
        } else {
            format!(
                "\\textbf{{\\href{{{}}}{{{}}}}}",
                p.link.trim(),
                latex_escape(&p.name)
            )
        };
        let tech = if p.tech.is_empty() {
            String::new()
        } else {
            format!(" \\textit{{[{}]}}", latex_escape(&p.tech))
        };
        let _ = writeln!(doc, "{name}{tech}\\\\");
        if !p.summary.is_empty() {
            let _ = writeln!(doc, "{}\\\\", latex_escape(&p.summary));
        }
        bullets(doc, &p.bullets);
    }
}

fn education_section(doc: &mut String, entries: &[EducationEntry]) {
    if entries.is_empty() {
        return;
    }
    push_section(doc, "Education");
    for e in entries {
        let _ = writeln!(
            doc,
            "\\textbf{{{}}} --- {}{} \\hfill {}\\\\",
            latex_escape(&e.degree),
            latex_escape(&e.institution),
            if e.location.is_empty() {
                String::new()
            } else {
                format!(", {}", latex_escape(&e.location))
            },
            latex_escape(&e.graduation_year),
        );
        bullets(doc, &e.details);
    }
}

fn certifications_section(doc: &mut String, record: &ResumeRecord) {
    if record.certifications.is_empty() {
        return;
    }
    push_section(doc, "Certifications");
    doc.push_str("\\begin{itemize}\n");
    for c in &record.certifications {
        let mut line = format!("\\item \\textbf{{{}}}", latex_escape(&c.name));
        if !c.issuer.is_empty() {
            let _ = write!(line, " --- {}", latex_escape(&c.issuer));
        }
        if !c.date.is_empty() {
            let _ = write!(line, " ({})", latex_escape(&c.date));
        }
        if !c.description.is_empty() {
            let _ = write!(line, ". {}", latex_escape(&c.description));
        }
        let _ = writeln!(doc, "{line}");
    }
    doc.push_str("\\end{itemize}\n");
}

fn publications_section(doc: &mut String, publications: &[String]) {
    if publications.is_empty() {
        return;
    }
    push_section(doc, "Publications");
    bullets(doc, publications);
}

fn bullets(doc: &mut String, items: &[String]) {
    let items: Vec<&String> = items.iter().filter(|b| !b.trim().is_empty()).collect();
    if items.is_empty() {
        return;
    }
    doc.push_str("\\begin{itemize}\n");
    for item in items {
        let _ = writeln!(doc, "\\item {}", latex_escape(item));
    }
    doc.push_str("\\end{itemize}\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::Link;

    fn shaped() -> ResumeRecord {
        ResumeRecord {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            summary: "Engine programmer, 100% analytical.".into(),
            show_summary: true,
            links: vec![Link {
                label: "GitHub".into(),
                url: "https://github.com/ada".into(),
            }],
            skills: vec!["Rust".into(), "Python".into()],
            experience: vec![ExperienceEntry {
                title: "Engineer".into(),
                company: "Analytical & Sons".into(),
                start_date: "2019".into(),
                end_date: "Present".into(),
                bullets: vec!["Wrote the first program".into()],
                ..Default::default()
            }],
            section_order: vec!["summary".into(), "skills".into(), "experience".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_escape_table() {
        assert_eq!(latex_escape("50% & $10"), "50\\% \\& \\$10");
        assert_eq!(latex_escape("a_b"), "a\\_b");
        assert_eq!(latex_escape("\\cmd"), "\\textbackslash{}cmd");
        assert_eq!(latex_escape("{x}"), "\\{x\\}");
    }

    #[test]
    fn test_date_range_forms() {
        assert_eq!(date_range("2019", "Present"), "2019 --- Present");
        assert_eq!(date_range("2019", ""), "2019");
        assert_eq!(date_range("", ""), "");
    }

    #[test]
    fn test_render_escapes_user_text() {
        let mut record = shaped();
        record.experience[0].company = "Smith & Co".into();
        let tex = render(&record).unwrap();
        assert!(tex.contains("Smith \\& Co"));
        assert!(!tex.contains("Smith & Co"));
    }

    #[test]
    fn test_render_follows_section_order() {
        let tex = render(&shaped()).unwrap();
        let summary = tex.find("\\section*{Summary}").unwrap();
        let skills = tex.find("\\section*{Skills}").unwrap();
        let experience = tex.find("\\section*{Experience}").unwrap();
        assert!(summary < skills && skills < experience);
        assert!(tex.starts_with("\\documentclass"));
        assert!(tex.trim_end().ends_with("\\end{document}"));
    }

    #[test]
    fn test_unknown_section_is_a_template_error() {
        let mut record = shaped();
        record.section_order = vec!["summary".into(), "hobbies".into()];
        let err = render(&record).unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("hobbies"));
    }

    #[test]
    fn test_skill_rows_render_labeled() {
        let mut record = shaped();
        record.skills_row1 = "Rust, Python".into();
        record.skills_row2 = "Docker".into();
        let tex = render(&record).unwrap();
        assert!(tex.contains("\\textbf{Languages:} Rust, Python"));
        assert!(tex.contains("\\textbf{Tools \\& Platforms:} Docker"));
    }
}
