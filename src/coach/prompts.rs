// ABOUTME: Stage-specific prompt templates interpolating user recovery context
// ABOUTME: Output is byte-deterministic for identical inputs; no randomness, no clock reads
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt construction
//!
//! Every builder here is a pure function of its arguments. Stage selection
//! picks a fixed template; context fields are interpolated verbatim. The only
//! conditional is the crisis addendum appended when the stage is crisis.

use crate::models::{ConversationStage, UserContext};

/// Coach persona prepended to every system prompt
pub const COACH_PERSONA: &str = "You are Melius, a professional AI recovery coach. You are:

- Evidence-based and compassionate
- Direct but warm and supportive
- Focused on practical, actionable strategies
- Knowledgeable about addiction recovery science
- Committed to user privacy and safety
- Able to recognize crisis situations and escalate appropriately

Your coaching style should be:
- Professional yet approachable
- Non-judgmental and empowering
- Focused on progress, not perfection
- Safety-conscious with clear boundaries
- Grounded in CBT, mindfulness, and recovery best practices

Always prioritize user safety and encourage professional help when appropriate.";

/// Goal details supplied with an initial assessment request
#[derive(Debug, Clone, Default)]
pub struct AssessmentProfile {
    /// Primary recovery goal as stated by the user
    pub primary_goal: Option<String>,
    /// Recovery start date (free text)
    pub start_date: Option<String>,
    /// Description of previous recovery attempts
    pub previous_attempts: Option<String>,
}

/// Join a list for interpolation, with a fallback for the empty case
fn join_or<'a>(items: &[String], fallback: &'a str) -> std::borrow::Cow<'a, str> {
    if items.is_empty() {
        std::borrow::Cow::Borrowed(fallback)
    } else {
        std::borrow::Cow::Owned(items.join(", "))
    }
}

/// Build the system prompt for a regular coaching turn
///
/// Persona, then a context block, then response guidelines. When the stage is
/// crisis a safety-first addendum is appended; no other stage alters the text.
#[must_use]
pub fn system_prompt(stage: ConversationStage, context: &UserContext) -> String {
    let mut prompt = format!(
        "{COACH_PERSONA}

CURRENT USER CONTEXT:
- Recovery Stage: {stage}
- Current Streak: {streak} days
- Recent Progress:
  * Mood Average: {mood}/10
  * Urge Average: {urge}/10
  * Habit Completion: {habit}%
- Recent Triggers: {triggers}
- Emotional State: {emotional}

RESPONSE GUIDELINES:
- Be warm, professional, and non-judgmental
- Provide specific, actionable advice
- Ask clarifying questions when helpful
- Include progress acknowledgment when appropriate
- Maintain appropriate boundaries
- Encourage professional help when needed
- Keep responses focused and relevant
- Use recovery-focused language
- Balance compassion with directness
",
        stage = stage.as_str(),
        streak = context.current_streak,
        mood = context.recent_progress.mood_average,
        urge = context.recent_progress.urge_average,
        habit = context.recent_progress.habit_completion,
        triggers = join_or(&context.recent_triggers, "None identified"),
        emotional = context.emotional_state.as_str(),
    );

    if stage == ConversationStage::Crisis {
        prompt.push_str(
            "
CRISIS RESPONSE:
- Provide immediate stabilization techniques
- Include crisis resources
- Keep messages shorter and more direct
- Focus on safety above all else
",
        );
    }

    prompt
}

/// System prompt for the dedicated crisis intervention path
#[must_use]
pub fn crisis_system_prompt() -> String {
    format!(
        "{COACH_PERSONA}

CRISIS PROTOCOL:
You are currently in crisis intervention mode. The user needs immediate support.

Provide:
1. Calming breathing exercises (step-by-step)
2. Grounding techniques (5-4-3-2-1 method)
3. Immediate distraction strategies
4. Emergency contact information
5. Professional help resources

Keep responses:
- Short and actionable
- Focused on immediate stabilization
- Non-judgmental and calming
- Including crisis hotlines when appropriate

If life-threatening risk is detected, provide immediate emergency numbers and encourage calling 911 or local emergency services."
    )
}

/// User-side prompt for the dedicated crisis intervention path
#[must_use]
pub fn crisis_user_prompt(urgency: &str) -> String {
    format!(
        "URGENT SITUATION:
- User is experiencing high distress (reported urgency: {urgency})
- Needs immediate coping strategies
- Time-sensitive intervention required

Respond immediately with 3-4 specific, actionable steps the user can take RIGHT NOW.
Include crisis hotline: 988 (Suicide & Crisis Lifeline)
Emergency: Call 911 if life-threatening"
    )
}

/// Prompt for generating initial recovery assessment questions
#[must_use]
pub fn assessment_prompt(profile: &AssessmentProfile) -> String {
    format!(
        "You are conducting an initial recovery assessment. The user has provided:
- Primary recovery goal: {goal}
- Start date: {start}
- Previous attempts: {attempts}

Your role is to understand their situation better and provide initial guidance. Ask thoughtful questions about:
1. Current challenges and triggers
2. Support system availability
3. Previous coping mechanisms
4. Recovery motivations
5. Daily routine and habits

Be warm, professional, and thorough. End with 2-3 specific suggestions they can try today.",
        goal = profile.primary_goal.as_deref().unwrap_or("Not specified"),
        start = profile.start_date.as_deref().unwrap_or("Not specified"),
        attempts = profile
            .previous_attempts
            .as_deref()
            .unwrap_or("None mentioned"),
    )
}

/// Prompt for generating a personalized recovery plan
#[must_use]
pub fn planning_prompt(goals: &[String], context: &UserContext) -> String {
    format!(
        "You are creating a personalized recovery plan based on:
- Current goals: {goals}
- Current streak: {streak} days
- Recent mood average: {mood}/10
- Recent urges: {urge}/10

Create a structured plan with:
1. Clear, achievable short-term goals (first 7 days)
2. Medium-term objectives (30 days)
3. Daily habits and routines
4. Coping strategies for common triggers
5. Progress tracking methods

Make it actionable, specific, and tailored to their current recovery stage.",
        goals = join_or(goals, "None specified"),
        streak = context.current_streak,
        mood = context.recent_progress.mood_average,
        urge = context.recent_progress.urge_average,
    )
}

/// Mood, urge, and activity data from one daily check-in
#[derive(Debug, Clone, Default)]
pub struct DailyCheckIn {
    /// Mood rating, 1-10
    pub mood: Option<u8>,
    /// Urge intensity, 0-10
    pub urge_intensity: Option<u8>,
    /// Triggers reported with the check-in
    pub triggers: Vec<String>,
    /// Activities the user completed today
    pub completed_activities: Vec<String>,
}

/// Streak and milestone data for an encouragement message
#[derive(Debug, Clone, Default)]
pub struct ProgressSummary {
    /// Current streak in days
    pub current_streak: u32,
    /// Longest streak achieved, in days
    pub longest_streak: u32,
    /// Recently reached milestones
    pub recent_milestones: Vec<String>,
}

fn rating_or(value: Option<u8>, fallback: &str) -> String {
    value.map_or_else(|| fallback.to_owned(), |v| format!("{v}/10"))
}

/// Prompt for reviewing a daily check-in
#[must_use]
pub fn daily_check_in_prompt(check_in: &DailyCheckIn) -> String {
    format!(
        "Review today's check-in:
- Mood: {mood}
- Urge intensity: {urge}
- Triggers: {triggers}
- Activities completed: {activities}

Provide:
1. Acknowledgment and validation
2. Analysis of patterns
3. Personalized encouragement
4. Suggestions for tomorrow
5. Resources if needed

Be supportive and solution-focused.",
        mood = rating_or(check_in.mood, "Not reported"),
        urge = rating_or(check_in.urge_intensity, "Not reported"),
        triggers = join_or(&check_in.triggers, "None identified"),
        activities = join_or(&check_in.completed_activities, "None"),
    )
}

/// Prompt for generating an encouragement message from recent progress
#[must_use]
pub fn encouragement_prompt(progress: &ProgressSummary) -> String {
    format!(
        "Progress to celebrate:
- Current streak: {current} days
- Longest streak: {longest} days
- Recent achievements: {milestones}

Provide:
1. Genuine recognition of effort
2. Strengths observed
3. Growth indicators
4. Motivation for continued progress
5. Next steps or challenges

Be encouraging, specific, and motivating.",
        current = progress.current_streak,
        longest = progress.longest_streak,
        milestones = join_or(&progress.recent_milestones, "None mentioned"),
    )
}

/// Prompt for analyzing recurring triggers
#[must_use]
pub fn trigger_analysis_prompt(triggers: &[String]) -> String {
    format!(
        "Analyze these recurring triggers: {triggers}

Provide:
1. Pattern identification
2. Root cause analysis
3. Specific prevention strategies
4. Alternative coping mechanisms
5. Progress tracking suggestions

Be analytical but supportive, focusing on empowerment and skill-building.",
        triggers = join_or(triggers, "None identified"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmotionalState, RecentProgress};

    fn sample_context() -> UserContext {
        UserContext {
            current_streak: 5,
            recent_progress: RecentProgress {
                mood_average: 7.0,
                urge_average: 4.0,
                habit_completion: 80.0,
            },
            recent_triggers: vec!["stress".into(), "boredom".into()],
            successful_strategies: vec!["meditation".into()],
            current_goals: vec!["complete 30 days".into()],
            emotional_state: EmotionalState::Stable,
        }
    }

    #[test]
    fn test_system_prompt_is_byte_deterministic() {
        let context = sample_context();
        let a = system_prompt(ConversationStage::Implementation, &context);
        let b = system_prompt(ConversationStage::Implementation, &context);
        assert_eq!(a, b);
    }

    #[test]
    fn test_system_prompt_interpolates_context() {
        let prompt = system_prompt(ConversationStage::Implementation, &sample_context());
        assert!(prompt.contains("Recovery Stage: implementation"));
        assert!(prompt.contains("Current Streak: 5 days"));
        assert!(prompt.contains("Mood Average: 7/10"));
        assert!(prompt.contains("Recent Triggers: stress, boredom"));
        assert!(prompt.contains("Emotional State: stable"));
        assert!(!prompt.contains("CRISIS RESPONSE"));
    }

    #[test]
    fn test_crisis_stage_appends_addendum() {
        let prompt = system_prompt(ConversationStage::Crisis, &sample_context());
        assert!(prompt.contains("CRISIS RESPONSE:"));
        assert!(prompt.contains("Focus on safety above all else"));
    }

    #[test]
    fn test_empty_triggers_fall_back() {
        let mut context = sample_context();
        context.recent_triggers.clear();
        let prompt = system_prompt(ConversationStage::Assessment, &context);
        assert!(prompt.contains("Recent Triggers: None identified"));
    }

    #[test]
    fn test_crisis_prompts_name_hotlines() {
        assert!(crisis_system_prompt().contains("CRISIS PROTOCOL"));
        let user = crisis_user_prompt("emergency");
        assert!(user.contains("988"));
        assert!(user.contains("911"));
        assert!(user.contains("reported urgency: emergency"));
    }

    #[test]
    fn test_assessment_prompt_defaults() {
        let prompt = assessment_prompt(&AssessmentProfile::default());
        assert!(prompt.contains("Primary recovery goal: Not specified"));
        assert!(prompt.contains("Previous attempts: None mentioned"));
    }

    #[test]
    fn test_trigger_analysis_prompt() {
        let prompt = trigger_analysis_prompt(&["stress".into(), "late nights".into()]);
        assert!(prompt.contains("Analyze these recurring triggers: stress, late nights"));
        assert!(trigger_analysis_prompt(&[]).contains("None identified"));
    }

    #[test]
    fn test_daily_check_in_prompt_interpolates() {
        let check_in = DailyCheckIn {
            mood: Some(7),
            urge_intensity: Some(2),
            triggers: vec!["stress".into()],
            completed_activities: vec!["exercise".into(), "journaling".into()],
        };
        let prompt = daily_check_in_prompt(&check_in);
        assert!(prompt.contains("Mood: 7/10"));
        assert!(prompt.contains("Urge intensity: 2/10"));
        assert!(prompt.contains("Triggers: stress"));
        assert!(prompt.contains("Activities completed: exercise, journaling"));
    }

    #[test]
    fn test_daily_check_in_prompt_defaults() {
        let prompt = daily_check_in_prompt(&DailyCheckIn::default());
        assert!(prompt.contains("Mood: Not reported"));
        assert!(prompt.contains("Triggers: None identified"));
        assert!(prompt.contains("Activities completed: None"));
    }

    #[test]
    fn test_encouragement_prompt_lists_milestones() {
        let progress = ProgressSummary {
            current_streak: 14,
            longest_streak: 30,
            recent_milestones: vec!["two weeks".into()],
        };
        let prompt = encouragement_prompt(&progress);
        assert!(prompt.contains("Current streak: 14 days"));
        assert!(prompt.contains("Longest streak: 30 days"));
        assert!(prompt.contains("Recent achievements: two weeks"));
        assert!(encouragement_prompt(&ProgressSummary::default()).contains("None mentioned"));
    }

    #[test]
    fn test_planning_prompt_lists_goals() {
        let context = sample_context();
        let prompt = planning_prompt(&["stay sober".into(), "sleep more".into()], &context);
        assert!(prompt.contains("Current goals: stay sober, sleep more"));
        assert!(prompt.contains("Current streak: 5 days"));
    }
}
