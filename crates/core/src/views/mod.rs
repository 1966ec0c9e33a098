pub mod flame_graph;
