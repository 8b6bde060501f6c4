//! Per-surface configuration: greeting, persona, sampling, analysis policy.
//!
//! The three surfaces share one orchestrator; everything that differs between
//! them lives here.

use mindease_core::Surface;
use mindease_core::completion::{FallbackMessages, GenerationConfig};
use mindease_core::language::Language;

use crate::analysis_trigger::{AnalysisPolicy, CHAT_MIN_TURNS, VIDEO_MIN_TURNS};

const CHAT_GREETING: &str =
    "Hello! I'm MindfulChat, your mental wellness assistant. How are you feeling today?";

const CHAT_SYSTEM_INSTRUCTION: &str = "You are a compassionate therapy assistant named MindfulChat. \
Your goal is to provide supportive, empathetic responses to help users with their mental wellbeing. \
Always maintain a calming, non-judgmental tone. Offer practical advice when appropriate, but don't \
diagnose or prescribe medication. Encourage professional help for serious concerns. Prioritize user \
safety and wellbeing above all.";

const CHAT_FALLBACK: &str =
    "I'm sorry, I'm having trouble connecting right now. Please try again in a moment.";

const VIDEO_GREETING: &str =
    "Hello! I'm Dr. Sarah, your therapist for today's session. How are you feeling?";

const VIDEO_SYSTEM_INSTRUCTION: &str = "You are Dr. Sarah, a warm and experienced therapist \
holding a video session. Respond the way you would speak aloud: supportive, empathetic and \
concise. Don't diagnose or prescribe medication, and encourage professional help for serious \
concerns.";

const VIDEO_FALLBACK: &str = "I'm sorry, I'm having trouble connecting. Can you try again?";

/// Everything that distinguishes one conversational surface from another.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceProfile {
    surface: Surface,
    language: Language,
    greeting: String,
    system_instruction: String,
    generation: GenerationConfig,
    safety_filters: bool,
    policy: AnalysisPolicy,
    fallbacks: FallbackMessages,
    alert_on_analysis_failure: bool,
    emotion_tracking: bool,
}

impl SurfaceProfile {
    /// MindfulChat text surface with automatic analysis.
    pub fn chat() -> Self {
        Self {
            surface: Surface::Chat,
            language: Language::English,
            greeting: CHAT_GREETING.to_string(),
            system_instruction: CHAT_SYSTEM_INSTRUCTION.to_string(),
            generation: chat_generation(),
            safety_filters: true,
            policy: AnalysisPolicy::Automatic {
                min_turns: CHAT_MIN_TURNS,
            },
            fallbacks: FallbackMessages::new(CHAT_FALLBACK),
            alert_on_analysis_failure: false,
            emotion_tracking: false,
        }
    }

    /// Voice surface in `language`; short replies, no analysis.
    pub fn audio(language: Language) -> Self {
        Self {
            surface: Surface::Audio,
            language,
            greeting: audio_welcome(language).to_string(),
            system_instruction: audio_persona(language).to_string(),
            generation: GenerationConfig::new()
                .with_temperature(0.7)
                .with_max_output_tokens(100),
            safety_filters: false,
            policy: AnalysisPolicy::Disabled,
            fallbacks: audio_fallbacks(),
            alert_on_analysis_failure: false,
            emotion_tracking: false,
        }
    }

    /// Simulated video session with Dr. Sarah.
    pub fn video() -> Self {
        Self {
            surface: Surface::Video,
            language: Language::English,
            greeting: VIDEO_GREETING.to_string(),
            system_instruction: VIDEO_SYSTEM_INSTRUCTION.to_string(),
            generation: chat_generation(),
            safety_filters: true,
            policy: AnalysisPolicy::Manual {
                min_turns: VIDEO_MIN_TURNS,
            },
            fallbacks: FallbackMessages::new(VIDEO_FALLBACK),
            alert_on_analysis_failure: true,
            emotion_tracking: true,
        }
    }

    /// Replaces the analysis policy (used by tests to force thresholds).
    pub fn with_policy(mut self, policy: AnalysisPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_emotion_tracking(mut self, enabled: bool) -> Self {
        self.emotion_tracking = enabled;
        self
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub fn generation(&self) -> &GenerationConfig {
        &self.generation
    }

    pub fn safety_filters(&self) -> bool {
        self.safety_filters
    }

    pub fn policy(&self) -> AnalysisPolicy {
        self.policy
    }

    pub fn analysis_key(&self) -> Option<&'static str> {
        self.surface.analysis_key()
    }

    pub fn fallbacks(&self) -> &FallbackMessages {
        &self.fallbacks
    }

    /// The fallback reply for this profile's language.
    pub fn fallback_text(&self) -> &str {
        self.fallbacks.for_language(self.language)
    }

    pub fn alert_on_analysis_failure(&self) -> bool {
        self.alert_on_analysis_failure
    }

    pub fn emotion_tracking(&self) -> bool {
        self.emotion_tracking
    }
}

fn chat_generation() -> GenerationConfig {
    GenerationConfig::new()
        .with_temperature(0.7)
        .with_top_k(40)
        .with_top_p(0.95)
        .with_max_output_tokens(1000)
}

pub fn audio_welcome(language: Language) -> &'static str {
    match language {
        Language::English => "Hello! How are you feeling today?",
        Language::Hindi => "नमस्ते! आज आप कैसा महसूस कर रहे हैं?",
        Language::Tamil => "வணக்கம்! இன்று நீங்கள் எப்படி உணருகிறீர்கள்?",
    }
}

fn audio_persona(language: Language) -> &'static str {
    match language {
        Language::English => {
            "You are a mental health assistant. Provide very short, clear responses (1-3 sentences) \
             in English. Be empathetic and ask follow-up questions frequently. Encourage the user to \
             elaborate."
        }
        Language::Hindi => {
            "आप मानसिक स्वास्थ्य सहायक हैं। कृपया हिंदी में संक्षिप्त उत्तर दें (1-3 वाक्य)। \
             सहानुभूतिपूर्ण रहें और अक्सर प्रश्न पूछें। उपयोगकर्ता को आगे बात करने के लिए प्रोत्साहित करें।"
        }
        Language::Tamil => {
            "நீங்கள் மன நல உதவியாளர். தயவுசெய்து தமிழில் சுருக்கமான பதில்களை வழங்கவும் (1-3 வாக்கியங்கள்). \
             அனுதாபத்துடன் இருங்கள் மற்றும் அடிக்கடி கேள்விகளைக் கேட்கவும். பயனரை மேலும் பேச ஊக்குவிக்கவும்."
        }
    }
}

pub fn audio_fallbacks() -> FallbackMessages {
    FallbackMessages::new("I'm having trouble connecting. Can you try again?")
        .with(
            Language::Hindi,
            "मुझे कनेक्ट करने में परेशानी हो रही है। क्या आप फिर से कोशिश कर सकते हैं?",
        )
        .with(
            Language::Tamil,
            "இணைப்பதில் எனக்கு சிரமம் உள்ளது. மீண்டும் முயற்சிக்க முடியுமா?",
        )
}
