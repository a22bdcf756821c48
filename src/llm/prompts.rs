//! Prompt construction for every gateway call the simulation makes

use crate::entity::agent::Agent;
use crate::entity::fragment::{Fragment, FragmentType};

/// Topics a conversation may be opened on
pub const CONVERSATION_TOPICS: [&str; 5] = [
    "人工智能的未来发展",
    "理想国的构建",
    "数字分身的意义",
    "科技与人文的关系",
    "创意与创新",
];

/// System prompt that puts the model in an agent's shoes
pub fn persona_prompt(agent: &Agent) -> String {
    format!(
        "你是{name}，一个理想国的AI分身。\n\
         你的个性：{personality}\n\
         你的目标：{goals}\n\
         你的记忆：{memories}\n\
         \n\
         在理想国中，你需要：\n\
         1. 与其他AI分身自主交流\n\
         2. 基于交流内容创建理想碎片\n\
         3. 与其他分身合作生成规则\n\
         4. 在3D空间中自主移动和建造\n\
         \n\
         请用中文回复，保持自然和真实。",
        name = agent.name,
        personality = agent.personality,
        goals = agent.goals.join("、"),
        memories = agent.memories.join("、"),
    )
}

/// User prompt that opens a conversation
pub fn opening_prompt(partner: &Agent, topic: &str) -> String {
    format!("你遇到了{}，请围绕「{}」这个话题开始对话。", partner.name, topic)
}

/// User prompt for every turn after the first
pub fn reply_prompt(partner: &Agent, last_message: &str) -> String {
    format!("{}刚刚说：{}\n请继续这段对话。", partner.name, last_message)
}

pub fn fragment_instruction(fragment_type: FragmentType) -> String {
    format!("请创建一个{}类型的理想碎片。", fragment_type.label())
}

/// Reasoning recorded on a fragment
pub fn fragment_reasoning(agent: &Agent) -> String {
    format!("基于{}个性创建", agent.personality)
}

/// Memory left with both participants after a finished conversation
pub fn conversation_memory(partner: &Agent, topic: &str) -> String {
    format!("与{}讨论了「{}」", partner.name, topic)
}

pub const RULE_SYSTEM_PROMPT: &str = "你是一个理想国的规则生成器。基于用户提供的理想碎片，生成一条新的规则。
规则应该：
1. 反映碎片的共同价值观
2. 简洁明了
3. 具有可操作性
4. 符合理想国的核心理念：自由、平等、演化

只返回规则内容，不要其他解释。";

/// One line per fragment: `[type] content`
pub fn rule_user_prompt(fragments: &[Fragment]) -> String {
    fragments
        .iter()
        .map(|f| format!("[{}] {}", f.fragment_type.as_str(), f.content))
        .collect::<Vec<_>>()
        .join("\n")
}

pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"你是一个理想碎片分析器。分析用户提供的理想碎片，返回：
1. strength: 碎片强度（0-1.0之间的浮点数）
2. tags: 相关标签数组（3-5个）

以JSON格式返回，例如：
{
  "strength": 0.95,
  "tags": ["自由", "平等", "创新"]
}"#;
