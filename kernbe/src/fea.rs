//! Writes classified kerning as feature file text.

use std::fmt::Display;

use bitflags::bitflags;
use chrono::{DateTime, Local};
use log::info;
use serde::{Deserialize, Serialize};

use kernir::source::KerningSource;

use crate::{
    classify::{Bucket, Buckets, ClassifiedKerning},
    options::KernOptions,
    subtables::SubtablePartitioner,
};

const RTL_LOOKUP_NAME: &str = "RTL_kerning";

bitflags! {
    /// The lookupflag of a kerning lookup.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct LookupFlags: u16 {
        const RIGHT_TO_LEFT = 0x0001;
        const IGNORE_MARKS = 0x0008;
    }
}

impl Display for LookupFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("lookupflag")?;
        if self.is_empty() {
            return f.write_str(" 0;");
        }
        if self.contains(LookupFlags::RIGHT_TO_LEFT) {
            f.write_str(" RightToLeft")?;
        }
        if self.contains(LookupFlags::IGNORE_MARKS) {
            f.write_str(" IgnoreMarks")?;
        }
        f.write_str(";")
    }
}

/// The text of a kern feature file and what was left out of it.
#[derive(Clone, Debug, PartialEq)]
pub struct KernFeature {
    pub text: String,
    /// Pairs below the minimum value, dropped or commented out
    pub trimmed: usize,
}

/// One run of `pos` statements under a comment.
struct Section<'b> {
    bucket: &'b Bucket,
    min_value: u32,
    label: &'static str,
    enumerate: bool,
}

/// Renders buckets into feature file syntax.
pub struct FeatureEmitter<'a> {
    source: &'a dyn KerningSource,
    options: &'a KernOptions,
    trimmed: usize,
    subtables_written: usize,
}

impl<'a> FeatureEmitter<'a> {
    pub fn new(source: &'a dyn KerningSource, options: &'a KernOptions) -> FeatureEmitter<'a> {
        FeatureEmitter {
            source,
            options,
            trimmed: 0,
            subtables_written: 0,
        }
    }

    /// Comment lines at the top of the file.
    pub fn header(&self, created: Option<DateTime<Local>>) -> Vec<String> {
        let mut header = Vec::new();
        if let Some(created) = created {
            header.push(format!("# Created: {}", created.format("%a %b %e %H:%M:%S %Y")));
        }
        header.push(format!(
            "# PS Name: {}",
            self.source.postscript_font_name().unwrap_or("None")
        ));
        header.push(format!("# MinKern: +/- {} inclusive", self.options.min_value));
        header
    }

    /// `pos` statements for a bucket, sorted.
    ///
    /// Static values with a magnitude below `min_value` are trimmed: dropped,
    /// or commented out when trimmed pairs are to be written.
    pub fn pos_lines(&mut self, bucket: &Bucket, min_value: u32, enumerate: bool, rtl: bool) -> String {
        let mut lines = Vec::with_capacity(bucket.len());
        for ((first, second), value) in bucket.iter() {
            let mut value_string = self.source.value_string(value);
            if rtl {
                value_string = format!("<{value_string} 0 {value_string} 0>");
            }
            let prefix = if enumerate { "enum " } else { "" };
            let line = format!("{prefix}pos {first} {second} {value_string};");
            let trim = value
                .static_value()
                .is_some_and(|v| v.abs() < min_value as f64);
            if trim {
                self.trimmed += 1;
                if self.options.write_trimmed_pairs {
                    lines.push(format!("# {line}"));
                }
            } else {
                lines.push(line);
            }
        }
        lines.sort();
        lines.join("\n")
    }

    fn sections(&self, buckets: &'a Buckets) -> Vec<Section<'a>> {
        let min_value = self.options.min_value;
        let mut sections = vec![
            Section {
                bucket: &buckets.predefined_exceptions,
                min_value: 0,
                label: "pre-defined exceptions",
                enumerate: true,
            },
            Section {
                bucket: &buckets.glyph_glyph,
                min_value,
                label: "glyph, glyph",
                enumerate: false,
            },
            Section {
                bucket: &buckets.glyph_glyph_exceptions,
                min_value: 0,
                label: "glyph, glyph exceptions",
                enumerate: false,
            },
            Section {
                bucket: &buckets.glyph_group_exceptions,
                min_value: 0,
                label: "glyph, group exceptions",
                enumerate: true,
            },
            Section {
                bucket: &buckets.group_glyph_exceptions,
                min_value: 0,
                label: "group, glyph exceptions",
                enumerate: true,
            },
        ];
        if !self.options.write_subtables {
            sections.push(Section {
                bucket: &buckets.glyph_group,
                min_value,
                label: "glyph, group",
                enumerate: false,
            });
            sections.push(Section {
                bucket: &buckets.group_group,
                min_value,
                label: "group, group/glyph",
                enumerate: false,
            });
        }
        sections
    }

    fn subtable_output(
        &mut self,
        subtables: &[Bucket],
        label: &str,
        rtl: bool,
        output: &mut Vec<String>,
    ) {
        if subtables.iter().all(|s| s.is_empty()) {
            return;
        }
        output.push(comment(label, rtl));
        for subtable in subtables.iter().filter(|s| !s.is_empty()) {
            self.subtables_written += 1;
            if self.subtables_written > 1 {
                output.push("\nsubtable;".to_string());
            }
            output.push(self.pos_lines(subtable, self.options.min_value, false, rtl));
        }
    }

    fn direction_output(
        &mut self,
        classified: &'a ClassifiedKerning,
        buckets: &'a Buckets,
        rtl: bool,
        output: &mut Vec<String>,
    ) {
        self.subtables_written = 0;
        for section in self.sections(buckets) {
            if section.bucket.is_empty() {
                continue;
            }
            output.push(comment(section.label, rtl));
            output.push(self.pos_lines(section.bucket, section.min_value, section.enumerate, rtl));
        }
        if self.options.write_subtables {
            let kerned_glyphs = classified.kerned_glyphs();
            let partitioner = SubtablePartitioner::new(
                &classified.groups,
                &kerned_glyphs,
                self.options.subtable_size,
            );
            let glyph_group = partitioner.partition(&buckets.glyph_group);
            self.subtable_output(&glyph_group, "glyph, group", rtl, output);
            let group_group = partitioner.partition(&buckets.group_group);
            self.subtable_output(&group_group, "group, glyph and group, group", rtl, output);
        }
    }

    /// The whole file.
    pub fn emit(mut self, classified: &'a ClassifiedKerning) -> KernFeature {
        let created = self.options.write_timestamp.then(Local::now);
        let header = self.header(created);

        let mut output: Vec<String> = classified
            .groups
            .iter()
            .map(|(name, members)| {
                let members: Vec<_> = members.iter().map(|g| g.as_str()).collect();
                format!("{name} = [{}];", members.join(" "))
            })
            .collect();

        self.direction_output(classified, &classified.ltr, false, &mut output);

        if !classified.rtl.is_empty() {
            let flags = LookupFlags::RIGHT_TO_LEFT | LookupFlags::IGNORE_MARKS;
            output.push(format!("\n\nlookup {RTL_LOOKUP_NAME} {{\n{flags}\n"));
            self.direction_output(classified, &classified.rtl, true, &mut output);
            output.push(format!("\n\n}} {RTL_LOOKUP_NAME};\n"));
        }

        if self.trimmed > 0 {
            info!("Trimmed pairs: {}", self.trimmed);
        }
        KernFeature {
            text: format!("{}\n\n{}\n", header.join("\n"), output.join("\n")),
            trimmed: self.trimmed,
        }
    }
}

fn comment(label: &str, rtl: bool) -> String {
    let direction = if rtl { "RTL " } else { "" };
    format!("\n# {direction}{label}:")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use kernir::{ir::KernValue, source::MemorySource};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{classify::KernClassifier, sanitize::sanitize};

    fn emit(source: &MemorySource, options: &KernOptions) -> KernFeature {
        let _ = env_logger::builder().is_test(true).try_init();
        let classified = KernClassifier::new(source, sanitize(source), options).classify();
        FeatureEmitter::new(source, options).emit(&classified)
    }

    fn bucket(pairs: &[(&str, &str, f64)]) -> Bucket {
        pairs
            .iter()
            .map(|(a, b, v)| {
                (
                    (
                        kernir::ir::KernSide::Glyph((*a).into()),
                        kernir::ir::KernSide::Glyph((*b).into()),
                    ),
                    KernValue::from(*v),
                )
            })
            .collect()
    }

    #[test]
    fn lookupflag_text() {
        assert_eq!(
            "lookupflag RightToLeft IgnoreMarks;",
            (LookupFlags::RIGHT_TO_LEFT | LookupFlags::IGNORE_MARKS).to_string()
        );
        assert_eq!("lookupflag 0;", LookupFlags::empty().to_string());
    }

    #[test]
    fn header_lines() {
        let source = MemorySource::new();
        let options = KernOptions::default();
        let emitter = FeatureEmitter::new(&source, &options);
        assert_eq!(
            vec!["# PS Name: None", "# MinKern: +/- 3 inclusive"],
            emitter.header(None)
        );
        let created = Local.with_ymd_and_hms(2023, 3, 7, 9, 5, 1).unwrap();
        let header = emitter.header(Some(created));
        assert_eq!(3, header.len());
        assert_eq!("# Created: Tue Mar  7 09:05:01 2023", header[0]);
    }

    #[test]
    fn pos_lines_trim_and_sort() {
        let source = MemorySource::new();
        let options = KernOptions::default();
        let mut emitter = FeatureEmitter::new(&source, &options);
        let pairs = bucket(&[("A", "A", 1.0), ("A", "B", -10.0), ("a", "c", 12.5)]);
        assert_eq!("pos A A 1;\npos A B -10;\npos a c 12.5;", emitter.pos_lines(&pairs, 0, false, false));
        assert_eq!("pos A B -10;\npos a c 12.5;", emitter.pos_lines(&pairs, 2, false, false));
        assert_eq!(1, emitter.trimmed);
        assert_eq!(
            "enum pos A A <1 0 1 0>;\nenum pos A B <-10 0 -10 0>;\nenum pos a c <12.5 0 12.5 0>;",
            emitter.pos_lines(&pairs, 0, true, true)
        );
    }

    #[test]
    fn trimmed_pairs_as_comments() {
        let source = MemorySource::new();
        let options = KernOptions {
            write_trimmed_pairs: true,
            ..Default::default()
        };
        let mut emitter = FeatureEmitter::new(&source, &options);
        let pairs = bucket(&[("A", "A", 1.0), ("A", "B", -10.0)]);
        assert_eq!("# pos A A 1;\npos A B -10;", emitter.pos_lines(&pairs, 2, false, false));
    }

    fn example() -> MemorySource {
        MemorySource::new()
            .with_postscript_font_name("Example-Regular")
            .with_group("public.kern1.A", &["A", "Aacute"])
            .with_group("public.kern2.V", &["V", "W"])
            .with_group("public.kern2.o", &["o", "a"])
            .with_pair("public.kern1.A", "public.kern2.V", -80.0)
            .with_pair("Aacute", "V", -40.0)
            .with_pair("T", "public.kern2.o", -60.0)
            .with_pair("T", "period", -2.0)
            .with_pair("V", "period", -70.0)
            .with_pair("public.kern1.A", "T", -50.0)
            .with_pair("public.kern1.A", "public.kern2.o", 0.0)
            .with_pair("public.kern1.A", "W", -75.0)
            .with_implied_glyphs()
    }

    #[test]
    fn default_file() {
        let feature = emit(&example(), &KernOptions::default());
        assert_eq!(
            "\
# PS Name: Example-Regular
# MinKern: +/- 3 inclusive

@MMK_L_A = [A Aacute];
@MMK_R_V = [V W];
@MMK_R_o = [o a];

# glyph, glyph:
pos V period -70;

# glyph, glyph exceptions:
pos Aacute V -40;

# group, glyph exceptions:
enum pos @MMK_L_A W -75;

# glyph, group:
pos T @MMK_R_o -60;

# group, group/glyph:
pos @MMK_L_A @MMK_R_V -80;
pos @MMK_L_A T -50;
",
            feature.text
        );
        assert_eq!(1, feature.trimmed);
    }

    #[test]
    fn subtable_file() {
        let options = KernOptions {
            write_subtables: true,
            subtable_size: 1,
            ..Default::default()
        };
        let source = example()
            .with_group("public.kern1.O", &["O", "Q"])
            .with_pair("public.kern1.O", "public.kern2.V", -30.0)
            .with_implied_glyphs();
        let feature = emit(&source, &options);
        assert_eq!(
            "\
# PS Name: Example-Regular
# MinKern: +/- 3 inclusive

@MMK_L_A = [A Aacute];
@MMK_R_V = [V W];
@MMK_R_o = [o a];
@MMK_L_O = [O Q];

# glyph, glyph:
pos V period -70;

# glyph, glyph exceptions:
pos Aacute V -40;

# group, glyph exceptions:
enum pos @MMK_L_A W -75;

# glyph, group:
pos T @MMK_R_o -60;

# group, glyph and group, group:

subtable;
pos @MMK_L_A @MMK_R_V -80;
pos @MMK_L_A T -50;

subtable;
pos @MMK_L_O @MMK_R_V -30;
",
            feature.text
        );
    }

    #[test]
    fn rtl_lookup() {
        let source = MemorySource::new()
            .with_group("public.kern1.ARA_beh", &["beh", "teh"])
            .with_group("public.kern2.ARA_alef", &["alef"])
            .with_pair("public.kern1.ARA_beh", "public.kern2.ARA_alef", -30.0)
            .with_pair("teh", "alef", -35.0)
            .with_pair("T", "o", -20.0)
            .with_implied_glyphs();
        let feature = emit(&source, &KernOptions::default());
        assert_eq!(
            "\
# PS Name: None
# MinKern: +/- 3 inclusive

@MMK_L_ARA_beh = [beh teh];
@MMK_R_ARA_alef = [alef];

# glyph, glyph:
pos T o -20;


lookup RTL_kerning {
lookupflag RightToLeft IgnoreMarks;


# RTL glyph, glyph exceptions:
pos teh alef <-35 0 -35 0>;

# RTL group, group/glyph:
pos @MMK_L_ARA_beh @MMK_R_ARA_alef <-30 0 -30 0>;


} RTL_kerning;

",
            feature.text
        );
    }

    #[test]
    fn glyph_kerning_counts_towards_subtable_size() {
        let mut source = MemorySource::new()
            .with_group("public.kern1.O", &["O", "Q"])
            .with_group("public.kern1.H", &["H", "I"])
            .with_group("public.kern2.T", &["T", "Tcaron"])
            .with_pair("public.kern1.O", "public.kern2.T", -30.0)
            .with_pair("public.kern1.H", "public.kern2.T", -10.0);
        let options = KernOptions {
            write_subtables: true,
            subtable_size: 855,
            ..Default::default()
        };
        // the group pairs alone estimate at 14 + 38 for one first operand, 14 + 44 for both
        let feature = emit(&source.clone().with_implied_glyphs(), &options);
        assert_eq!(0, feature.text.matches("subtable;").count());

        // 400 more kerned glyphs: coverage 2 + 2 * 406, so both no longer fit
        for i in 0..200 {
            source = source.with_pair(&format!("p{i}"), &format!("q{i}"), -10.0);
        }
        let feature = emit(&source.with_implied_glyphs(), &options);
        assert_eq!(1, feature.text.matches("subtable;").count());
    }

    #[test]
    fn no_rtl_lookup_without_rtl_pairs() {
        let feature = emit(&example(), &KernOptions::default());
        assert!(!feature.text.contains("RTL_kerning"));
    }

    #[test]
    fn predefined_exceptions_come_first() {
        let source = MemorySource::new()
            .with_group("@MMK_L_EXC_A", &["Aring"])
            .with_group("@MMK_R_V", &["V"])
            .with_pair("@MMK_L_EXC_A", "@MMK_R_V", 1.0)
            .with_pair("T", "o", -20.0)
            .with_implied_glyphs();
        let feature = emit(&source, &KernOptions::default());
        assert_eq!(
            "\
# PS Name: None
# MinKern: +/- 3 inclusive

@MMK_L_EXC_A = [Aring];
@MMK_R_V = [V];

# pre-defined exceptions:
enum pos @MMK_L_EXC_A @MMK_R_V 1;

# glyph, glyph:
pos T o -20;
",
            feature.text
        );
        assert_eq!(0, feature.trimmed);
    }

    #[test]
    fn variable_values_are_never_trimmed() {
        let source = MemorySource::new()
            .with_locations(vec![
                kernir::ir::Location::new().with("wght", 300.0).unwrap(),
                kernir::ir::Location::new().with("wght", 700.0).unwrap(),
            ])
            .with_variable_pair("T", "o", &[Some(-1.0), None])
            .unwrap()
            .with_implied_glyphs();
        let feature = emit(&source, &KernOptions::default());
        assert!(feature.text.contains("pos T o (wght=300:-1);"));
        assert_eq!(0, feature.trimmed);
    }
}
