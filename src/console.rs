//! Interactive terminal form.
//!
//! Walks the user through the 21 questions in column order, encodes the
//! answers the way the training data does and prints one of three outcomes.

use std::fmt;
use std::io::{self, BufRead, Write};

use tracing::{debug, error};

use crate::classifier::Classifier;
use crate::schema::{FeatureVector, N_FEATURES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    /// Numeric code used in the training data.
    pub fn code(self) -> f64 {
        match self {
            Sex::Female => 0.0,
            Sex::Male => 1.0,
        }
    }

    pub fn parse(input: &str) -> Option<Sex> {
        match input.trim().to_ascii_lowercase().as_str() {
            "female" | "f" => Some(Sex::Female),
            "male" | "m" => Some(Sex::Male),
            _ => None,
        }
    }
}

/// How a question is answered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// No / yes, encoded 0 / 1.
    Binary,
    /// Whole number in `min..=max`.
    Slider { min: u8, max: u8 },
    /// Real number in `min..=max`.
    Number { min: f64, max: f64, default: f64 },
    /// Female / Male, encoded 0 / 1.
    Sex,
}

impl FieldKind {
    pub fn default_value(&self) -> f64 {
        match *self {
            FieldKind::Binary => 0.0,
            FieldKind::Slider { min, .. } => f64::from(min),
            FieldKind::Number { default, .. } => default,
            FieldKind::Sex => Sex::Female.code(),
        }
    }

    /// Encodes one answer. An empty answer takes the default.
    pub fn parse(&self, input: &str) -> Result<f64, String> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(self.default_value());
        }
        match *self {
            FieldKind::Binary => match input.to_ascii_lowercase().as_str() {
                "0" | "n" | "no" => Ok(0.0),
                "1" | "y" | "yes" => Ok(1.0),
                _ => Err("answer 0 (no) or 1 (yes)".to_string()),
            },
            FieldKind::Slider { min, max } => match input.parse::<u8>() {
                Ok(v) if (min..=max).contains(&v) => Ok(f64::from(v)),
                _ => Err(format!("enter a whole number from {min} to {max}")),
            },
            FieldKind::Number { min, max, .. } => match input.parse::<f64>() {
                Ok(v) if (min..=max).contains(&v) => Ok(v),
                _ => Err(format!("enter a number from {min} to {max}")),
            },
            FieldKind::Sex => Sex::parse(input)
                .map(Sex::code)
                .ok_or_else(|| "answer Female or Male".to_string()),
        }
    }

    fn choices(&self) -> String {
        match *self {
            FieldKind::Binary => "0 = No, 1 = Yes".to_string(),
            FieldKind::Slider { min, max } => format!("{min}-{max}"),
            FieldKind::Number { min, max, default } => format!("{min}-{max}, default {default}"),
            FieldKind::Sex => "Female/Male".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub label: &'static str,
    pub help: Option<&'static str>,
    pub kind: FieldKind,
}

const fn binary(name: &'static str, label: &'static str) -> Field {
    Field {
        name,
        label,
        help: None,
        kind: FieldKind::Binary,
    }
}

const fn slider(name: &'static str, label: &'static str, min: u8, max: u8, help: Option<&'static str>) -> Field {
    Field {
        name,
        label,
        help,
        kind: FieldKind::Slider { min, max },
    }
}

/// The questions, in feature column order.
pub const FORM: [Field; N_FEATURES] = [
    binary("HighBP", "High Blood Pressure"),
    binary("HighChol", "High Cholesterol"),
    binary("CholCheck", "Cholesterol Checked in Last 5 Years"),
    Field {
        name: "BMI",
        label: "Body Mass Index (BMI)",
        help: Some("BMI = weight (kg) / height² (m²)"),
        kind: FieldKind::Number {
            min: 10.0,
            max: 60.0,
            default: 25.0,
        },
    },
    binary("Smoker", "Smoked at least 100 cigarettes in lifetime"),
    binary("Stroke", "Ever had a stroke"),
    binary("HeartDiseaseorAttack", "Heart disease or heart attack"),
    binary("PhysActivity", "Physical activity in last 30 days"),
    binary("Fruits", "Consumes fruits daily"),
    binary("Veggies", "Consumes vegetables daily"),
    binary("HvyAlcoholConsump", "Heavy alcohol consumption"),
    binary("AnyHealthcare", "Has health insurance"),
    binary("NoDocbcCost", "Could not see doctor due to cost"),
    slider(
        "GenHlth",
        "General Health",
        1,
        5,
        Some("1 = Excellent, 2 = Very Good, 3 = Good, 4 = Fair, 5 = Poor"),
    ),
    slider("MentHlth", "Mental health bad days (last 30 days)", 0, 30, None),
    slider("PhysHlth", "Physical health bad days (last 30 days)", 0, 30, None),
    binary("DiffWalk", "Difficulty walking or climbing stairs"),
    Field {
        name: "Sex",
        label: "Sex",
        help: None,
        kind: FieldKind::Sex,
    },
    slider(
        "Age",
        "Age Group",
        1,
        13,
        Some("1: 18-24, 2: 25-29, 3: 30-34, 4: 35-39, 5: 40-44, 6: 45-49, 7: 50-54, 8: 55-59, 9: 60-64, 10: 65-69, 11: 70-74, 12: 75-79, 13: 80+"),
    ),
    slider(
        "Education",
        "Education Level",
        1,
        6,
        Some("1: Never attended school, 2: Elementary, 3: Some high school, 4: High school graduate, 5: Some college, 6: College graduate"),
    ),
    slider(
        "Income",
        "Income Level",
        1,
        8,
        Some("1: < $10k, 2: $10k-15k, 3: $15k-20k, 4: $20k-25k, 5: $25k-35k, 6: $35k-50k, 7: $50k-75k, 8: > $75k"),
    ),
];

/// What the user is told for a predicted class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    NoDiabetes,
    Prediabetes,
    Diabetes,
}

impl Outcome {
    pub fn from_prediction(prediction: usize) -> Outcome {
        match prediction {
            0 => Outcome::NoDiabetes,
            1 => Outcome::Prediabetes,
            _ => Outcome::Diabetes,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Outcome::NoDiabetes => "No Diabetes Detected",
            Outcome::Prediabetes => "Prediabetes Detected",
            Outcome::Diabetes => "Diabetes Detected — Please consult a doctor",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Outcome::NoDiabetes => "✅",
            Outcome::Prediabetes => "⚠️",
            Outcome::Diabetes => "🚨",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.icon(), self.message())
    }
}

/// One interactive session over arbitrary input/output streams.
pub struct Console<'m, R, W> {
    model: &'m dyn Classifier,
    input: R,
    output: W,
}

impl<'m, R: BufRead, W: Write> Console<'m, R, W> {
    pub fn new(model: &'m dyn Classifier, input: R, output: W) -> Self {
        Console {
            model,
            input,
            output,
        }
    }

    /// Runs forms until the user quits or input ends.
    pub fn run(&mut self) -> io::Result<()> {
        writeln!(self.output, "🩺 Diabetes Risk Prediction System")?;
        writeln!(
            self.output,
            "Predicts diabetes risk from clinical and lifestyle data (CDC Behavioral Risk Factor survey)."
        )?;
        writeln!(self.output, "Press Enter to accept the default shown for a question.")?;

        loop {
            writeln!(self.output)?;
            writeln!(self.output, "🧍 Personal & Health Information")?;
            let Some(features) = self.collect()? else {
                break;
            };

            match self.ask("🔮 Predict Diabetes Risk? [Enter = predict, q = quit]: ")? {
                Some(answer) if !answer.trim().eq_ignore_ascii_case("q") => {}
                _ => break,
            }

            writeln!(self.output, "{}", "-".repeat(40))?;
            match self.model.predict_one(&features) {
                Ok(prediction) => {
                    debug!(prediction, "console prediction");
                    writeln!(self.output, "{}", Outcome::from_prediction(prediction))?;
                }
                Err(e) => {
                    error!(error = %e, "console prediction failed");
                    writeln!(self.output, "❌ Prediction failed: {e}")?;
                }
            }

            match self.ask("Predict again? [y/N]: ")? {
                Some(answer) if matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") => {}
                _ => break,
            }
        }

        writeln!(self.output, "Goodbye!")?;
        Ok(())
    }

    /// Asks every question in order. `None` when input ends early.
    pub fn collect(&mut self) -> io::Result<Option<FeatureVector>> {
        let mut values = [0.0; N_FEATURES];
        for (value, field) in values.iter_mut().zip(FORM.iter()) {
            match self.ask_field(field)? {
                Some(v) => *value = v,
                None => return Ok(None),
            }
        }
        Ok(Some(FeatureVector(values)))
    }

    fn ask_field(&mut self, field: &Field) -> io::Result<Option<f64>> {
        if let Some(help) = field.help {
            writeln!(self.output, "  ({help})")?;
        }
        let prompt = format!("{} [{}]: ", field.label, field.kind.choices());
        loop {
            let Some(answer) = self.ask(&prompt)? else {
                return Ok(None);
            };
            match field.kind.parse(&answer) {
                Ok(v) => return Ok(Some(v)),
                Err(hint) => writeln!(self.output, "  {hint}")?,
            }
        }
    }

    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::schema::FEATURE_NAMES;
    use ndarray::{Array1, ArrayView2};
    use std::io::Cursor;
    use std::sync::Mutex;

    /// Remembers what it was asked and always answers `label`.
    struct Recorder {
        label: usize,
        seen: Mutex<Vec<Vec<f64>>>,
    }

    impl Recorder {
        fn new(label: usize) -> Self {
            Recorder {
                label,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Classifier for Recorder {
        fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<usize>> {
            let mut seen = self.seen.lock().unwrap();
            for row in features.rows() {
                seen.push(row.to_vec());
            }
            Ok(Array1::from_elem(features.nrows(), self.label))
        }
    }

    /// 21 answers followed by an empty line that confirms the prediction.
    fn answers(sex: &str) -> String {
        let mut lines = vec!["1", "0", "1", "31.5", "0", "0", "0", "1", "1", "1", "0", "1", "0"];
        lines.extend(["3", "5", "2", "0", sex, "9", "4", "6", ""]);
        lines.join("\n") + "\n"
    }

    fn session(model: &dyn Classifier, input: &str) -> String {
        let mut out = Vec::new();
        Console::new(model, Cursor::new(input.to_string()), &mut out)
            .run()
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn sex_encoding() {
        assert_eq!(Sex::Male.code(), 1.0);
        assert_eq!(Sex::Female.code(), 0.0);
        assert_eq!(FieldKind::Sex.parse("Male"), Ok(1.0));
        assert_eq!(FieldKind::Sex.parse("female"), Ok(0.0));
        assert!(FieldKind::Sex.parse("1").is_err());
    }

    #[test]
    fn outcomes_cover_every_prediction() {
        assert_eq!(Outcome::from_prediction(0), Outcome::NoDiabetes);
        assert_eq!(Outcome::from_prediction(1), Outcome::Prediabetes);
        assert_eq!(Outcome::from_prediction(2), Outcome::Diabetes);
        assert_eq!(Outcome::from_prediction(7), Outcome::Diabetes);

        let messages = [0, 1, 2].map(|p| Outcome::from_prediction(p).message());
        assert_ne!(messages[0], messages[1]);
        assert_ne!(messages[1], messages[2]);
        assert_ne!(messages[0], messages[2]);
    }

    #[test]
    fn form_matches_feature_order() {
        let names: Vec<&str> = FORM.iter().map(|f| f.name).collect();
        assert_eq!(names, FEATURE_NAMES);
    }

    #[test]
    fn field_parsing() {
        let bmi = FORM[3].kind;
        assert_eq!(bmi.parse(""), Ok(25.0));
        assert_eq!(bmi.parse("40.2"), Ok(40.2));
        assert!(bmi.parse("75").is_err());

        let gen_hlth = FORM[13].kind;
        assert_eq!(gen_hlth.parse(""), Ok(1.0));
        assert!(gen_hlth.parse("0").is_err());
        assert!(gen_hlth.parse("2.5").is_err());

        assert_eq!(FieldKind::Binary.parse("yes"), Ok(1.0));
        assert!(FieldKind::Binary.parse("2").is_err());
    }

    #[test]
    fn assembles_features_in_column_order() {
        let model = Recorder::new(1);
        let out = session(&model, &answers("Male"));

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let row = &seen[0];
        assert_eq!(row.len(), N_FEATURES);
        assert_eq!(row[3], 31.5);
        assert_eq!(row[13], 3.0);
        assert_eq!(row[17], 1.0);
        assert_eq!(row[20], 6.0);
        assert!(out.contains("Prediabetes Detected"));
    }

    #[test]
    fn female_is_encoded_as_zero() {
        let model = Recorder::new(0);
        let out = session(&model, &answers("Female"));
        assert_eq!(model.seen.lock().unwrap()[0][17], 0.0);
        assert!(out.contains("No Diabetes Detected"));
    }

    #[test]
    fn reprompts_invalid_answers() {
        let model = Recorder::new(2);
        let input = format!("maybe\n{}", answers("M"));
        let out = session(&model, &input);
        assert!(out.contains("answer 0 (no) or 1 (yes)"));
        assert_eq!(model.seen.lock().unwrap()[0][0], 1.0);
        assert!(out.contains("Diabetes Detected — Please consult a doctor"));
    }

    #[test]
    fn predicts_again_on_request() {
        let model = Recorder::new(0);
        let input = format!("{}y\n{}n\n", answers("Male"), answers("Female"));
        let out = session(&model, &input);
        assert_eq!(model.seen.lock().unwrap().len(), 2);
        assert!(out.ends_with("Goodbye!\n"));
    }

    #[test]
    fn early_end_of_input_skips_prediction() {
        let model = Recorder::new(0);
        let out = session(&model, "1\n0\n");
        assert!(model.seen.lock().unwrap().is_empty());
        assert!(out.contains("Goodbye!"));
    }
}
