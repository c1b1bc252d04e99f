mod complex;
mod diagram;
mod network_description;
mod reaction;
mod reaction_network;
mod species;
