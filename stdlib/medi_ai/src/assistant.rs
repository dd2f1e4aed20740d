//! Rule-based screening assistant.
//!
//! Replies come from an ordered keyword table matched against the lower-cased
//! message by substring; the first matching rule wins. Rules about a specific
//! disease remember it in [`AssistantState::last_topic`] so that follow-ups
//! like "which tests?" or "help" can answer for that disease.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Diabetes,
    Heart,
    Parkinsons,
    Liver,
    Cancer,
}

/// Per-session memory of the assistant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantState {
    pub last_topic: Option<Topic>,
    /// Free-text place used for hospital searches.
    pub user_location: Option<String>,
}

struct ByTopic {
    diabetes: &'static str,
    heart: &'static str,
    parkinsons: &'static str,
    liver: &'static str,
    cancer: &'static str,
    unknown: &'static str,
}

impl ByTopic {
    fn pick(&self, topic: Option<Topic>) -> &'static str {
        match topic {
            Some(Topic::Diabetes) => self.diabetes,
            Some(Topic::Heart) => self.heart,
            Some(Topic::Parkinsons) => self.parkinsons,
            Some(Topic::Liver) => self.liver,
            Some(Topic::Cancer) => self.cancer,
            None => self.unknown,
        }
    }
}

enum Answer {
    Text(&'static str),
    PerTopic(&'static ByTopic),
    Hospitals,
}

struct Rule {
    keywords: &'static [&'static str],
    topic: Option<Topic>,
    answer: Answer,
}

const fn rule(keywords: &'static [&'static str], answer: &'static str) -> Rule {
    Rule {
        keywords,
        topic: None,
        answer: Answer::Text(answer),
    }
}

const fn topic_rule(keywords: &'static [&'static str], topic: Topic, answer: &'static str) -> Rule {
    Rule {
        keywords,
        topic: Some(topic),
        answer: Answer::Text(answer),
    }
}

const EMPTY_PROMPT: &str = "Hi! I can help with diabetes, heart disease, Parkinson's, liver disease, and breast cancer predictions. Ask me about inputs, data ranges, or interpreting results.";

const FALLBACK: &str = "I can help with inputs, ranges, and interpretation for diabetes, heart, Parkinson's, liver disease, and breast cancer. Ask about a specific disease, your symptoms, nearby hospitals, or say 'help'.";

const TESTS: ByTopic = ByTopic {
    diabetes: "Recommended tests for diabetes: Fasting Plasma Glucose, HbA1c, Oral Glucose Tolerance Test (as indicated), lipid profile, kidney function, urine microalbumin.",
    heart: "Cardiac tests: ECG, echocardiogram, lipid profile, fasting glucose/HbA1c, treadmill test or imaging stress test (as advised), cardiac enzymes if acute symptoms.",
    parkinsons: "Parkinson's is clinical; supportive tests may include DAT-SPECT (where available). Screen for reversible mimics (thyroid, B12). Neurology assessment recommended.",
    liver: "Liver tests: LFTs (ALT, AST, ALP, bilirubin, albumin), ultrasound, viral hepatitis panel, INR; FibroScan/CT based on clinician judgment.",
    cancer: "Breast cancer screening: mammography per age/risk, ultrasound/MRI as indicated; biopsy for definitive diagnosis under oncology guidance.",
    unknown: "Tell me which condition (diabetes/heart/parkinsons/liver/breast cancer) and I'll suggest appropriate tests.",
};

const INPUT_HELP: ByTopic = ByTopic {
    diabetes: "Diabetes inputs: Pregnancies, Glucose, BloodPressure, SkinThickness, Insulin, BMI, DPF, Age. Keep values within suggested ranges on the page.",
    heart: "Heart inputs: Age, Sex, Chest Pain Type, Resting BP, Cholesterol, FBS, Resting ECG, Max HR, Exercise Angina, Oldpeak, Slope, CA, Thal.",
    parkinsons: "Parkinson's inputs: MDVP Fo/Fhi/Flo, jitter/shimmer family, NHR, HNR, RPDE, DFA, spread1/2, D2, PPE.",
    liver: "Liver inputs: Age, Gender, Total/Direct Bilirubin, Alkaline Phosphatase, ALT, AST, Total Proteins, Albumin, A/G Ratio.",
    cancer: "Breast Cancer inputs: radius/texture/perimeter/area means and SEs, smoothness/compactness/concavity, concave points, symmetry, fractal dimension.",
    unknown: "You can open a disease page, fill inputs within suggested ranges, and request a result. I'll explain inputs and how to read probabilities.",
};

static RULES: &[Rule] = &[
    rule(
        &["hello", "hi", "hey", "good morning", "good afternoon", "good evening"],
        "Hello! I'm your AI health assistant. I can help you with disease predictions, symptoms, lifestyle advice, and medical guidance. What would you like to know?",
    ),
    rule(
        &["thank", "thanks", "thank you"],
        "You're very welcome! I'm here to help with any health-related questions. Feel free to ask about symptoms, prevention, or use our prediction tools.",
    ),
    rule(
        &["bye", "goodbye", "see you", "exit"],
        "Take care and stay healthy! Remember to consult healthcare professionals for any serious concerns. Have a great day!",
    ),
    rule(
        &["what can you do", "capabilities", "features", "what do you know", "abilities"],
        "I can help you with:\n\
         🔹 Disease predictions (Diabetes, Heart Disease, Parkinson's, Liver Disease, Breast Cancer)\n\
         🔹 Symptom analysis and guidance\n\
         🔹 Lifestyle and dietary recommendations\n\
         🔹 Medical test interpretations\n\
         🔹 Prevention strategies\n\
         🔹 When to see a doctor\n\
         Ask me anything about these topics!",
    ),
    rule(
        &["accurate", "accuracy", "reliable", "trust", "confidence"],
        "Our AI models are trained on medical datasets with good accuracy, but remember:\n\
         ⚠️ These are screening tools, not diagnostic tools\n\
         ⚠️ Always consult qualified healthcare professionals\n\
         ⚠️ Use predictions as guidance, not final diagnosis\n\
         ⚠️ Emergency symptoms need immediate medical attention",
    ),
    rule(
        &["privacy", "data", "safe", "secure", "confidential"],
        "Your privacy is important:\n\
         🔒 Data is processed locally and securely\n\
         🔒 No personal health data is stored permanently\n\
         🔒 Predictions are for your reference only\n\
         🔒 Always discuss results with your doctor",
    ),
    rule(
        &["emergency", "urgent", "chest pain severe", "heart attack", "stroke", "911"],
        "🚨 EMERGENCY SITUATIONS 🚨\n\
         Call emergency services immediately if you have:\n\
         • Severe chest pain or pressure\n\
         • Difficulty breathing\n\
         • Sudden weakness or numbness\n\
         • Loss of consciousness\n\
         • Severe bleeding\n\
         Don't wait - seek immediate medical help!",
    ),
    rule(
        &["age", "elderly", "senior", "old age", "aging"],
        "Age-related health considerations:\n\
         👴 Regular health screenings become more important\n\
         👴 Preventive care can catch issues early\n\
         👴 Stay active with age-appropriate exercises\n\
         👴 Maintain social connections for mental health\n\
         👴 Follow medication schedules carefully\n\
         Ask me about specific age-related conditions!",
    ),
    rule(
        &["prevent", "prevention", "avoid", "reduce risk"],
        "General disease prevention strategies:\n\
         🛡️ Maintain healthy weight\n\
         🛡️ Exercise regularly (150 min/week)\n\
         🛡️ Eat balanced, nutritious diet\n\
         🛡️ Don't smoke, limit alcohol\n\
         🛡️ Get adequate sleep (7-9 hours)\n\
         🛡️ Manage stress effectively\n\
         🛡️ Regular health check-ups\n\
         Ask about prevention for specific diseases!",
    ),
    rule(
        &["doctor", "physician", "when to see", "medical help"],
        "See a doctor when you have:\n\
         🩺 Persistent symptoms lasting >2 weeks\n\
         🩺 Sudden changes in health\n\
         🩺 Family history of serious conditions\n\
         🩺 Abnormal test results\n\
         🩺 Medication side effects\n\
         🩺 Concerns about symptoms\n\
         Regular check-ups are also important for prevention!",
    ),
    rule(
        &["mental health", "depression", "anxiety", "stress", "mood"],
        "Mental health is crucial for overall wellbeing:\n\
         🧠 Practice stress management techniques\n\
         🧠 Maintain social connections\n\
         🧠 Get regular exercise and sleep\n\
         🧠 Consider counseling if needed\n\
         🧠 Don't hesitate to seek professional help\n\
         Mental health affects physical health too!",
    ),
    rule(
        &["medication", "medicine", "pills", "drugs", "prescription"],
        "Medication safety tips:\n\
         💊 Take as prescribed by your doctor\n\
         💊 Don't skip doses or stop suddenly\n\
         💊 Be aware of side effects\n\
         💊 Check for drug interactions\n\
         💊 Store medications properly\n\
         💊 Keep updated medication list\n\
         Always consult your pharmacist or doctor about medications!",
    ),
    rule(
        &["family history", "genetics", "hereditary", "inherited"],
        "Family history is important because:\n\
         🧬 Many diseases have genetic components\n\
         🧬 Helps identify your risk factors\n\
         🧬 Guides screening recommendations\n\
         🧬 Influences prevention strategies\n\
         🧬 Important for early detection\n\
         Share family history with your healthcare provider!",
    ),
    rule(
        &["exercise", "fitness", "workout", "physical activity"],
        "Exercise benefits for disease prevention:\n\
         💪 Reduces diabetes risk by 30-40%\n\
         💪 Lowers heart disease risk\n\
         💪 Helps maintain healthy weight\n\
         💪 Improves mental health\n\
         💪 Strengthens immune system\n\
         💪 Aim for 150 minutes moderate activity/week\n\
         Start slowly and build up gradually!",
    ),
    rule(
        &["nutrition", "diet", "food", "eating", "healthy eating"],
        "Healthy eating guidelines:\n\
         🥗 Eat variety of fruits and vegetables\n\
         🥗 Choose whole grains over refined\n\
         🥗 Include lean proteins\n\
         🥗 Limit processed foods and added sugars\n\
         🥗 Control portion sizes\n\
         🥗 Stay hydrated with water\n\
         🥗 Limit sodium and saturated fats",
    ),
    rule(
        &["sleep", "insomnia", "tired", "fatigue", "rest"],
        "Sleep is vital for health:\n\
         😴 Adults need 7-9 hours nightly\n\
         😴 Poor sleep increases disease risk\n\
         😴 Affects immune system function\n\
         😴 Impacts mental health\n\
         😴 Keep regular sleep schedule\n\
         😴 Create comfortable sleep environment\n\
         Chronic sleep problems need medical evaluation!",
    ),
    rule(
        &["smoking", "tobacco", "cigarettes", "quit smoking"],
        "Smoking cessation benefits:\n\
         🚭 Reduces cancer risk significantly\n\
         🚭 Improves heart and lung health\n\
         🚭 Benefits start within 20 minutes of quitting\n\
         🚭 Reduces stroke and diabetes risk\n\
         🚭 Improves circulation and immunity\n\
         🚭 Many resources available to help quit\n\
         It's never too late to quit smoking!",
    ),
    rule(
        &["alcohol", "drinking", "wine", "beer", "liquor"],
        "Alcohol and health:\n\
         🍷 Moderate consumption: up to 1 drink/day (women), 2/day (men)\n\
         🍷 Excessive drinking increases disease risk\n\
         🍷 Can interact with medications\n\
         🍷 Affects liver, heart, and brain health\n\
         🍷 Consider alcohol-free days\n\
         🍷 Seek help if you can't control drinking",
    ),
    rule(
        &["weight", "obesity", "overweight", "bmi", "lose weight"],
        "Healthy weight management:\n\
         ⚖️ BMI 18.5-24.9 is generally healthy\n\
         ⚖️ Focus on gradual, sustainable changes\n\
         ⚖️ Combine diet and exercise\n\
         ⚖️ Excess weight increases disease risk\n\
         ⚖️ Even 5-10% loss has health benefits\n\
         ⚖️ Consult healthcare provider for guidance",
    ),
    rule(
        &["vaccine", "vaccination", "immunization", "shots"],
        "Vaccination importance:\n\
         💉 Prevents serious infectious diseases\n\
         💉 Protects community through herd immunity\n\
         💉 Especially important for high-risk groups\n\
         💉 Keep vaccination records updated\n\
         💉 Follow recommended schedules\n\
         💉 Discuss with healthcare provider\n\
         Vaccines are safe and effective!",
    ),
    rule(
        &[
            "lifestyle", "diet", "exercise", "workout", "sleep", "stress", "smoke", "alcohol",
            "food", "walking", "water",
        ],
        "General lifestyle guidance:\n\
         - Diet: prefer whole grains, vegetables, fruits, lean proteins; limit added sugar & trans-fats.\n\
         - Exercise: at least 150 minutes/week moderate activity (e.g., brisk walking) + 2 days strength training.\n\
         - Sleep: aim for 7-9 hours nightly; consistent schedule.\n\
         - Stress: practice breathing, mindfulness, or yoga 10-15 min/day.\n\
         - Avoid smoking; keep alcohol minimal. Stay hydrated (1.5-2.5 L/day depending on climate/size).\n\
         Ask me for disease-specific tips like: 'diabetes lifestyle' or 'heart lifestyle'.",
    ),
    topic_rule(
        &["diabetes lifestyle", "diabetic lifestyle", "diabetes diet", "lower sugar"],
        Topic::Diabetes,
        "Diabetes lifestyle tips:\n\
         - Diet: low glycemic index carbs, high fiber; distribute carbs evenly across meals.\n\
         - Exercise: 30-45 min/day brisk walk or cycling; add resistance training.\n\
         - Weight: aim for 5-7% loss if overweight.\n\
         - Monitor: check fasting glucose/HbA1c as advised.",
    ),
    topic_rule(
        &["heart lifestyle", "cardiac lifestyle", "heart diet", "lower cholesterol"],
        Topic::Heart,
        "Heart disease lifestyle tips:\n\
         - Diet: DASH/Mediterranean style; reduce salt (<5g/day), saturated fat, and processed foods.\n\
         - Exercise: 150-300 min/week cardio + 2 sessions strength.\n\
         - Stop smoking, limit alcohol; manage blood pressure, lipids, and blood sugar.",
    ),
    topic_rule(
        &["liver lifestyle", "liver diet", "fatty liver", "hepatitis diet"],
        Topic::Liver,
        "Liver health tips:\n\
         - Diet: balanced, avoid excess fructose/sugary drinks; adequate protein; limit alcohol.\n\
         - Exercise & weight: gradual weight loss if overweight (5-10%).\n\
         - Med safety: avoid unnecessary hepatotoxic meds; vaccinate for Hep A/B per guidance.",
    ),
    topic_rule(
        &["parkinson lifestyle", "parkinsons lifestyle", "parkinson diet", "parkinson exercise"],
        Topic::Parkinsons,
        "Parkinson's lifestyle tips:\n\
         - Regular physiotherapy, balance & flexibility exercises; speech therapy if hypophonia.\n\
         - Mediterranean-style diet; adequate hydration & fiber (manage constipation).\n\
         - Structure daily routine; optimize sleep hygiene.",
    ),
    topic_rule(
        &["breast cancer lifestyle", "cancer lifestyle", "oncology lifestyle"],
        Topic::Cancer,
        "Breast cancer risk reduction:\n\
         - Maintain healthy BMI, regular exercise, limit alcohol, avoid smoking.\n\
         - Follow age-appropriate screening schedules (mammography).",
    ),
    Rule {
        keywords: &["recommended test", "which tests", "what tests", "diagnostic test", "screening"],
        topic: None,
        answer: Answer::PerTopic(&TESTS),
    },
    topic_rule(
        &["chest pain", "shortness of breath", "angina", "palpitations"],
        Topic::Heart,
        "Chest-related symptoms could be cardiac. You can try the Heart Disease Prediction page and also consult a cardiologist if symptoms persist or are severe.",
    ),
    topic_rule(
        &["tremor", "stiffness", "slow movement", "bradykinesia"],
        Topic::Parkinsons,
        "Those symptoms may relate to Parkinson's. Use the Parkinson's Prediction page for guidance and consider seeing a neurologist.",
    ),
    topic_rule(
        &["jaundice", "yellow eyes", "liver pain", "abdominal pain", "bilirubin high"],
        Topic::Liver,
        "These signs could involve liver function. Try the Liver Disease Prediction and consult a hepatologist for evaluation.",
    ),
    topic_rule(
        &["high sugar", "hyperglycemia", "frequent urination", "excessive thirst"],
        Topic::Diabetes,
        "These may be related to diabetes. Use the Diabetes Prediction page and follow up with a clinician.",
    ),
    topic_rule(
        &["breast lump", "breast pain", "mammogram", "oncology"],
        Topic::Cancer,
        "Consider the Breast Cancer Prediction page for feature guidance. Please consult an oncologist for proper screening.",
    ),
    topic_rule(
        &["diabetes", "sugar", "glucose"],
        Topic::Diabetes,
        "For Diabetes Prediction, provide: Pregnancies, Glucose, BloodPressure, SkinThickness, Insulin, BMI, DPF, Age. \
         Interpretation: higher probability suggests increased diabetes risk. Always confirm with a clinician.",
    ),
    topic_rule(
        &["heart", "cardio", "cardiac"],
        Topic::Heart,
        "For Heart Disease Prediction, provide: Age, Sex, Chest Pain Type, Resting BP, Cholesterol, Fasting Blood Sugar, Resting ECG, Max Heart Rate, \
         Exercise-induced angina, Oldpeak, Slope, CA, Thal. Interpretation: positive prediction means you should consult a cardiologist.",
    ),
    topic_rule(
        &["parkinson", "tremor", "parkinsons"],
        Topic::Parkinsons,
        "For Parkinson's Prediction, provide acoustic features like MDVP Fo/Fhi/Flo, jitter/shimmer metrics, NHR, HNR, RPDE, DFA, spread1/2, D2, PPE. \
         Interpretation: model output is supportive, not diagnostic; see a neurologist.",
    ),
    topic_rule(
        &["liver", "hepat", "bilirubin"],
        Topic::Liver,
        "For Liver Disease Prediction, provide: Age, Gender, Total/Direct Bilirubin, Alkaline Phosphatase, ALT, AST, Total Proteins, Albumin, A/G Ratio. \
         Abnormal enzymes and high probabilities warrant hepatology consult.",
    ),
    topic_rule(
        &["cancer", "breast", "malignan", "benign"],
        Topic::Cancer,
        "For Breast Cancer Prediction, provide features like radius/texture/perimeter/area means and SEs, compactness/concavity, symmetry, fractal dimension. \
         Screening results should be confirmed by imaging and pathology; consult an oncologist.",
    ),
    Rule {
        keywords: &["hospital", "hospitals", "near", "nearby", "emergency", "clinic"],
        topic: None,
        answer: Answer::Hospitals,
    },
    Rule {
        keywords: &["help", "how", "guide", "input", "range", "tips", "advice"],
        topic: None,
        answer: Answer::PerTopic(&INPUT_HELP),
    },
];

fn hospitals(location: Option<&str>) -> String {
    match location.map(str::trim).filter(|l| !l.is_empty()) {
        Some(place) => format!(
            "Here are nearby hospitals for '{place}'. Open this link: \
             https://www.google.com/maps/search/hospitals+near+{}",
            place.replace(' ', "+")
        ),
        None => "To find nearby hospitals, set your location first. \
                 You can also ask like: 'nearest hospitals in Mumbai'."
            .to_string(),
    }
}

/// Answer one message, updating `state` when the message is about a disease.
pub fn reply(state: &mut AssistantState, message: &str) -> String {
    let text = message.trim().to_lowercase();
    if text.is_empty() {
        return EMPTY_PROMPT.to_string();
    }
    let Some(rule) = RULES
        .iter()
        .find(|r| r.keywords.iter().any(|k| text.contains(k)))
    else {
        return FALLBACK.to_string();
    };
    if let Some(topic) = rule.topic {
        state.last_topic = Some(topic);
    }
    match &rule.answer {
        Answer::Text(s) => s.to_string(),
        Answer::PerTopic(table) => table.pick(state.last_topic).to_string(),
        Answer::Hospitals => hospitals(state.user_location.as_deref()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

/// Chat history plus the assistant state it built up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub state: AssistantState,
    pub turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message`, answer it and return the answer.
    pub fn send(&mut self, message: &str) -> &str {
        let answer = reply(&mut self.state, message);
        self.turns.push(Turn {
            role: Role::User,
            text: message.to_string(),
        });
        self.turns.push(Turn {
            role: Role::Assistant,
            text: answer,
        });
        &self.turns[self.turns.len() - 1].text
    }

    pub fn assistant_replies(&self) -> impl Iterator<Item = &str> {
        self.turns
            .iter()
            .filter(|t| t.role == Role::Assistant)
            .map(|t| t.text.as_str())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ask(state: &mut AssistantState, message: &str) -> String {
        reply(state, message)
    }

    #[test]
    fn first_matching_rule_wins() {
        let mut s = AssistantState::default();
        assert!(ask(&mut s, "Hello there").starts_with("Hello! I'm your AI health assistant."));
        // "thank" is checked before "bye"
        assert!(ask(&mut s, "thanks, bye").starts_with("You're very welcome!"));
        assert!(ask(&mut s, "I feel tired all day").starts_with("Sleep is vital for health"));
    }

    #[test]
    fn empty_and_unknown_messages() {
        let mut s = AssistantState::default();
        assert_eq!(ask(&mut s, "   "), EMPTY_PROMPT);
        assert_eq!(ask(&mut s, "xyz"), FALLBACK);
        assert_eq!(s, AssistantState::default());
    }

    #[test]
    fn disease_rules_set_the_topic_for_follow_ups() {
        let mut s = AssistantState::default();
        assert_eq!(ask(&mut s, "recommended test"), TESTS.unknown);

        assert!(ask(&mut s, "lower sugar").starts_with("Diabetes lifestyle tips"));
        assert_eq!(s.last_topic, Some(Topic::Diabetes));
        assert_eq!(ask(&mut s, "recommended test"), TESTS.diabetes);

        assert!(ask(&mut s, "jaundice").starts_with("These signs could involve liver"));
        assert_eq!(s.last_topic, Some(Topic::Liver));
        assert_eq!(ask(&mut s, "guide"), INPUT_HELP.liver);
    }

    #[test]
    fn hospital_search_uses_the_location() {
        let mut s = AssistantState::default();
        assert!(ask(&mut s, "clinic").starts_with("To find nearby hospitals"));
        s.user_location = Some("New Delhi".into());
        assert_eq!(
            ask(&mut s, "clinic"),
            "Here are nearby hospitals for 'New Delhi'. Open this link: \
             https://www.google.com/maps/search/hospitals+near+New+Delhi"
        );
    }

    #[test]
    fn conversation_keeps_history() {
        let mut c = Conversation::new();
        let first = c.send("liver").to_string();
        assert!(first.starts_with("For Liver Disease Prediction"));
        c.send("screening");
        assert_eq!(c.turns.len(), 4);
        assert_eq!(c.turns[0], Turn { role: Role::User, text: "liver".into() });
        let replies: Vec<&str> = c.assistant_replies().collect();
        assert_eq!(replies[1], TESTS.liver);

        let json = serde_json::to_string(&c).unwrap();
        let back: Conversation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);

        c.clear();
        assert!(c.turns.is_empty());
        assert_eq!(c.state.last_topic, None);
    }
}
