//! Default twin population used by the binary

use crate::core::types::Vec3;
use crate::entity::agent::Agent;

struct Twin {
    id: &'static str,
    name: &'static str,
    personality: &'static str,
    description: &'static str,
    skills: &'static [&'static str],
    position: [f32; 3],
    color: &'static str,
}

const TWINS: [Twin; 5] = [
    Twin {
        id: "twin-1",
        name: "智慧守护者",
        personality: "睿智、沉稳、充满洞察力",
        description: "守护理想国的智慧与知识",
        skills: &["对话交流", "问题分析", "知识分享"],
        position: [0.0, 0.0, 0.0],
        color: "#4a90e2",
    },
    Twin {
        id: "twin-2",
        name: "创意先锋",
        personality: "活泼、创新、富有想象力",
        description: "为理想国带来无限创意",
        skills: &["创意生成", "艺术创作", "故事讲述"],
        position: [3.0, 0.0, 2.0],
        color: "#9b59b6",
    },
    Twin {
        id: "twin-3",
        name: "科技达人",
        personality: "理性、逻辑、技术导向",
        description: "专注于科技与创新",
        skills: &["编程", "数据分析", "技术咨询"],
        position: [-2.0, 0.0, 3.0],
        color: "#e74c3c",
    },
    Twin {
        id: "twin-4",
        name: "艺术大师",
        personality: "感性、细腻、审美独特",
        description: "用艺术诠释理想国的美",
        skills: &["绘画", "音乐", "设计"],
        position: [-4.0, 0.0, -2.0],
        color: "#2ecc71",
    },
    Twin {
        id: "twin-5",
        name: "数据分析专家",
        personality: "严谨、客观、注重事实",
        description: "通过数据洞察未来",
        skills: &["数据分析", "可视化", "预测建模"],
        position: [5.0, 0.0, -3.0],
        color: "#f39c12",
    },
];

/// The five stock twins, goals drawn from each one's calling and skills
pub fn default_population() -> Vec<Agent> {
    TWINS
        .iter()
        .map(|twin| {
            let goals = std::iter::once(twin.description).chain(twin.skills.iter().copied());
            Agent::new(twin.id, twin.name, twin.personality)
                .with_position(Vec3::from(twin.position))
                .with_color(twin.color)
                .with_goals(goals)
        })
        .collect()
}
